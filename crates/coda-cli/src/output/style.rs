//! Styling utilities for terminal output.

use owo_colors::OwoColorize;
use std::fmt;

/// Unicode/ASCII icons for terminal output
#[derive(Debug, Clone, Copy)]
pub enum Icon {
    Success,
    Error,
    Warning,
    Info,
    Arrow,
}

impl Icon {
    /// Get Unicode representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "\u{2714}",
            Self::Error => "\u{2718}",
            Self::Warning => "\u{26A0}",
            Self::Info => "\u{2139}",
            Self::Arrow => "\u{2192}",
        }
    }

    /// Get ASCII fallback
    pub const fn ascii(&self) -> &'static str {
        match self {
            Self::Success => "[OK]",
            Self::Error => "[ERR]",
            Self::Warning => "[WARN]",
            Self::Info => "[INFO]",
            Self::Arrow => "->",
        }
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if crate::output::unicode_enabled() {
            self.as_str()
        } else {
            self.ascii()
        })
    }
}

/// Theme for consistent styling
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors_enabled: bool,
    pub unicode_enabled: bool,
}

impl Theme {
    /// Create a new theme
    pub const fn new(colors_enabled: bool, unicode_enabled: bool) -> Self {
        Self {
            colors_enabled,
            unicode_enabled,
        }
    }

    /// Create a theme from current settings
    pub fn from_env() -> Self {
        Self::new(crate::output::colors_enabled(), crate::output::unicode_enabled())
    }

    /// Get an icon
    pub const fn icon(&self, icon: Icon) -> &'static str {
        if self.unicode_enabled {
            icon.as_str()
        } else {
            icon.ascii()
        }
    }

    /// Format an artifact coordinate
    pub fn coordinate(&self, text: &str) -> String {
        self.paint(text, |t| t.green().to_string())
    }

    /// Format a version
    pub fn version(&self, version: &str) -> String {
        self.paint(version, |t| t.yellow().to_string())
    }

    /// Format a URL
    pub fn url(&self, url: &str) -> String {
        self.paint(url, |t| t.blue().underline().to_string())
    }

    /// Format an error
    pub fn error(&self, text: &str) -> String {
        self.paint(text, |t| t.red().bold().to_string())
    }

    /// Format a warning
    pub fn warning(&self, text: &str) -> String {
        self.paint(text, |t| t.yellow().to_string())
    }

    /// Format success text
    pub fn success(&self, text: &str) -> String {
        self.paint(text, |t| t.green().to_string())
    }

    /// Format dim/secondary text
    pub fn dim(&self, text: &str) -> String {
        self.paint(text, |t| t.dimmed().to_string())
    }

    /// Format header text
    pub fn header(&self, text: &str) -> String {
        self.paint(text, |t| t.cyan().bold().to_string())
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> String) -> String {
        if self.colors_enabled {
            style(text)
        } else {
            text.to_string()
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_env()
    }
}
