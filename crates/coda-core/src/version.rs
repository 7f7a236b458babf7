//! Version specifications: exact, `LATEST`, snapshots and ranges.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Sentinel version meaning "the newest version listed in metadata".
pub const LATEST: &str = "LATEST";

/// Suffix reserved for mutable pre-release builds.
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Check whether a raw version string denotes a snapshot.
#[must_use]
pub fn is_snapshot(version: &str) -> bool {
    version.ends_with(SNAPSHOT_SUFFIX)
}

/// A requested version, as written in a coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VersionSpec {
    /// A concrete release version.
    Exact(String),
    /// Whatever the repository metadata lists last.
    #[default]
    Latest,
    /// A snapshot version, stored with its `-SNAPSHOT` suffix.
    Snapshot(String),
    /// An interval of acceptable versions.
    Range(VersionRange),
}

impl VersionSpec {
    /// Parse a version segment.
    ///
    /// # Errors
    /// Returns a parse error for an empty segment or a malformed range.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::parse(s, "version must not be empty"));
        }
        if s == LATEST {
            return Ok(Self::Latest);
        }
        if s.starts_with('[') || s.starts_with('(') {
            return VersionRange::parse(s).map(Self::Range);
        }
        if is_snapshot(s) {
            return Ok(Self::Snapshot(s.to_string()));
        }
        Ok(Self::Exact(s.to_string()))
    }

    /// Classify an already resolved version string (never a range).
    #[must_use]
    pub fn from_resolved(version: &str) -> Self {
        if is_snapshot(version) {
            Self::Snapshot(version.to_string())
        } else {
            Self::Exact(version.to_string())
        }
    }

    /// Whether this is the `LATEST` sentinel.
    #[must_use]
    pub const fn is_latest(&self) -> bool {
        matches!(self, Self::Latest)
    }

    /// Snapshot base version (`1.0` for `1.0-SNAPSHOT`).
    #[must_use]
    pub fn snapshot_base(&self) -> Option<&str> {
        match self {
            Self::Snapshot(v) => v.strip_suffix(SNAPSHOT_SUFFIX),
            _ => None,
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) | Self::Snapshot(v) => f.write_str(v),
            Self::Latest => f.write_str(LATEST),
            Self::Range(r) => r.fmt(f),
        }
    }
}

impl FromStr for VersionSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionSpec {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<VersionSpec> for String {
    fn from(value: VersionSpec) -> Self {
        value.to_string()
    }
}

/// Version interval with independently inclusive/exclusive bounds.
///
/// A missing bound is unbounded on that side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    /// Lower bound.
    pub lower: Option<String>,
    /// Whether the lower bound itself is included.
    pub lower_inclusive: bool,
    /// Upper bound.
    pub upper: Option<String>,
    /// Whether the upper bound itself is included.
    pub upper_inclusive: bool,
}

impl VersionRange {
    /// Parse `[1.0,2.0)`, `(,1.5]`, `[1.0,)` or `[1.0]`.
    ///
    /// # Errors
    /// Returns a parse error carrying the range text when malformed.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let lower_inclusive = match s.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => return Err(Error::parse(s, "range must start with '[' or '('")),
        };
        let upper_inclusive = match s.chars().last() {
            Some(']') if s.len() > 1 => true,
            Some(')') if s.len() > 1 => false,
            _ => return Err(Error::parse(s, "range must end with ']' or ')'")),
        };
        let body = &s[1..s.len() - 1];

        let Some((lo, hi)) = body.split_once(',') else {
            // Single version pinned with brackets.
            let v = body.trim();
            if v.is_empty() || !lower_inclusive || !upper_inclusive {
                return Err(Error::parse(s, "single-version range must be written as [x]"));
            }
            return Ok(Self::exactly(v));
        };
        if hi.contains(',') {
            return Err(Error::parse(s, "range must have exactly one ','"));
        }

        let lower = Some(lo.trim()).filter(|v| !v.is_empty()).map(str::to_string);
        let upper = Some(hi.trim()).filter(|v| !v.is_empty()).map(str::to_string);

        if let (Some(l), Some(u)) = (&lower, &upper) {
            match compare_versions(l, u) {
                Ordering::Greater => {
                    return Err(Error::parse(s, "lower bound is above upper bound"));
                }
                Ordering::Equal if !(lower_inclusive && upper_inclusive) => {
                    return Err(Error::parse(s, "range is empty"));
                }
                _ => {}
            }
        }

        Ok(Self {
            lower,
            lower_inclusive,
            upper,
            upper_inclusive,
        })
    }

    /// The closed range containing exactly one version.
    #[must_use]
    pub fn exactly(version: &str) -> Self {
        Self {
            lower: Some(version.to_string()),
            lower_inclusive: true,
            upper: Some(version.to_string()),
            upper_inclusive: true,
        }
    }

    /// Check whether a version falls inside this range.
    #[must_use]
    pub fn contains(&self, version: &str) -> bool {
        let above_lower = self.lower.as_deref().is_none_or(|lower| {
            match compare_versions(version, lower) {
                Ordering::Greater => true,
                Ordering::Equal => self.lower_inclusive,
                Ordering::Less => false,
            }
        });
        let below_upper = self.upper.as_deref().is_none_or(|upper| {
            match compare_versions(version, upper) {
                Ordering::Less => true,
                Ordering::Equal => self.upper_inclusive,
                Ordering::Greater => false,
            }
        });
        above_lower && below_upper
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{},{}{}",
            if self.lower_inclusive { '[' } else { '(' },
            self.lower.as_deref().unwrap_or(""),
            self.upper.as_deref().unwrap_or(""),
            if self.upper_inclusive { ']' } else { ')' },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item<'a> {
    Number(u64),
    Qualifier(&'a str),
}

fn items(version: &str) -> Vec<Item<'_>> {
    version
        .split(['.', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>()
                .map_or(Item::Qualifier(part), Item::Number)
        })
        .collect()
}

fn qualifier_rank(q: &str) -> u8 {
    match q.to_ascii_lowercase().as_str() {
        "alpha" | "a" => 0,
        "beta" | "b" => 1,
        "milestone" | "m" => 2,
        "rc" | "cr" => 3,
        "snapshot" => 4,
        "" | "ga" | "final" | "release" => 5,
        "sp" => 6,
        _ => 7,
    }
}

fn compare_items(a: &Item<'_>, b: &Item<'_>) -> Ordering {
    match (a, b) {
        (Item::Number(x), Item::Number(y)) => x.cmp(y),
        (Item::Number(_), Item::Qualifier(_)) => Ordering::Greater,
        (Item::Qualifier(_), Item::Number(_)) => Ordering::Less,
        (Item::Qualifier(x), Item::Qualifier(y)) => qualifier_rank(x)
            .cmp(&qualifier_rank(y))
            .then_with(|| x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase())),
    }
}

/// Compare two Maven-style version strings component-wise.
///
/// Numeric components compare numerically, qualifiers rank
/// `alpha < beta < milestone < rc < snapshot < release < sp`, and a
/// missing trailing component is padded so that `1.0 == 1.0.0` and
/// `1.0-beta < 1.0`.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = items(a);
    let right = items(b);
    let len = left.len().max(right.len());

    for i in 0..len {
        let ord = match (left.get(i), right.get(i)) {
            (Some(x), Some(y)) => compare_items(x, y),
            (Some(x), None) => compare_items(x, &pad_for(x)),
            (None, Some(y)) => compare_items(&pad_for(y), y),
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

const fn pad_for<'a>(other: &Item<'_>) -> Item<'a> {
    match other {
        Item::Number(_) => Item::Number(0),
        Item::Qualifier(_) => Item::Qualifier(""),
    }
}
