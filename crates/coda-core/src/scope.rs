//! Dependency scopes and their precedence order.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dependency scope label such as `compile` or `test`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    /// Label for compile scope.
    pub const COMPILE: &'static str = "compile";
    /// Label for runtime scope.
    pub const RUNTIME: &'static str = "runtime";
    /// Label for provided scope.
    pub const PROVIDED: &'static str = "provided";
    /// Label for system scope.
    pub const SYSTEM: &'static str = "system";
    /// Label for test scope.
    pub const TEST: &'static str = "test";

    /// Create a scope from a label. Labels are case-insensitive.
    #[must_use]
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(label.as_ref().trim().to_ascii_lowercase())
    }

    /// `compile` scope.
    #[must_use]
    pub fn compile() -> Self {
        Self::new(Self::COMPILE)
    }

    /// `runtime` scope.
    #[must_use]
    pub fn runtime() -> Self {
        Self::new(Self::RUNTIME)
    }

    /// `provided` scope.
    #[must_use]
    pub fn provided() -> Self {
        Self::new(Self::PROVIDED)
    }

    /// `test` scope.
    #[must_use]
    pub fn test() -> Self {
        Self::new(Self::TEST)
    }

    /// Get the label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::compile()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Scope {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Total order over scope labels, weakest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePrecedence {
    order: Vec<Scope>,
}

impl ScopePrecedence {
    /// Build a precedence table from labels listed weakest to strongest.
    ///
    /// # Errors
    /// Returns an error if the table is empty or lists a label twice.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut order: Vec<Scope> = Vec::new();
        for label in labels {
            let scope = Scope::new(label);
            if scope.as_str().is_empty() {
                return Err(Error::ScopePrecedence("empty scope label".into()));
            }
            if order.contains(&scope) {
                return Err(Error::ScopePrecedence(format!(
                    "scope '{scope}' listed twice"
                )));
            }
            order.push(scope);
        }
        if order.is_empty() {
            return Err(Error::ScopePrecedence("no scopes given".into()));
        }
        Ok(Self { order })
    }

    /// Rank of a scope, 0 being the weakest. `None` for unknown labels.
    #[must_use]
    pub fn rank(&self, scope: &Scope) -> Option<usize> {
        self.order.iter().position(|s| s == scope)
    }

    /// Whether the table knows this label.
    #[must_use]
    pub fn contains(&self, scope: &Scope) -> bool {
        self.rank(scope).is_some()
    }

    /// The weaker of two known scopes.
    #[must_use]
    pub fn weaker<'a>(&self, a: &'a Scope, b: &'a Scope) -> Option<&'a Scope> {
        Some(if self.rank(a)? <= self.rank(b)? { a } else { b })
    }

    /// The stronger of two known scopes.
    #[must_use]
    pub fn stronger<'a>(&self, a: &'a Scope, b: &'a Scope) -> Option<&'a Scope> {
        Some(if self.rank(a)? >= self.rank(b)? { a } else { b })
    }

    /// Whether `a` strictly outranks `b`.
    #[must_use]
    pub fn is_stronger(&self, a: &Scope, b: &Scope) -> Option<bool> {
        Some(self.rank(a)? > self.rank(b)?)
    }

    /// Labels, weakest first.
    pub fn labels(&self) -> impl Iterator<Item = &Scope> {
        self.order.iter()
    }
}

impl Default for ScopePrecedence {
    fn default() -> Self {
        Self {
            order: [
                Scope::TEST,
                Scope::PROVIDED,
                Scope::SYSTEM,
                Scope::RUNTIME,
                Scope::COMPILE,
            ]
            .into_iter()
            .map(Scope::new)
            .collect(),
        }
    }
}
