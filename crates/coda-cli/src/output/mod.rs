//! Terminal output helpers.

pub mod style;
pub mod table;

pub use style::{Icon, Theme};

use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static COLORS: AtomicBool = AtomicBool::new(false);
static UNICODE: AtomicBool = AtomicBool::new(true);
static QUIET: AtomicBool = AtomicBool::new(false);

/// Configure output once at startup. `force_ansi` overrides terminal
/// detection; `NO_COLOR` disables colors when not forced.
pub fn init(force_ansi: Option<bool>, quiet: bool) {
    let colors = force_ansi.unwrap_or_else(|| {
        std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
    });
    let unicode = std::env::var("TERM").map_or(true, |term| term != "dumb");
    COLORS.store(colors, Ordering::Relaxed);
    UNICODE.store(unicode, Ordering::Relaxed);
    QUIET.store(quiet, Ordering::Relaxed);
    owo_colors::set_override(colors);
}

/// Whether colored output is enabled.
pub fn colors_enabled() -> bool {
    COLORS.load(Ordering::Relaxed)
}

/// Whether Unicode icons are enabled.
pub fn unicode_enabled() -> bool {
    UNICODE.load(Ordering::Relaxed)
}

fn quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Print a section header.
pub fn header(text: &str) {
    if !quiet() {
        println!("{}", Theme::from_env().header(text));
    }
}

/// Print an informational line.
pub fn info(text: &str) {
    if !quiet() {
        println!("{} {text}", Theme::from_env().dim(&Icon::Info.to_string()));
    }
}

/// Print a success line.
pub fn success(text: &str) {
    if !quiet() {
        let theme = Theme::from_env();
        println!("{} {text}", theme.success(theme.icon(Icon::Success)));
    }
}

/// Print a warning to stderr.
pub fn warning(text: &str) {
    let theme = Theme::from_env();
    eprintln!("{} {}", theme.warning(theme.icon(Icon::Warning)), theme.warning(text));
}

/// Print an error to stderr. Never suppressed.
pub fn error(text: &str) {
    let theme = Theme::from_env();
    eprintln!("{} {}", theme.error(theme.icon(Icon::Error)), theme.error(text));
}

/// Human-readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Human-readable duration.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1_000 {
        format!("{millis}ms")
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, "0 B")]
    #[test_case(1023, "1023 B")]
    #[test_case(1024, "1.0 KiB")]
    #[test_case(5 * 1024 * 1024 + 512 * 1024, "5.5 MiB")]
    fn bytes(value: u64, expected: &str) {
        assert_eq!(format_bytes(value), expected);
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }
}
