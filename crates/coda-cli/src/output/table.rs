//! Table rendering on top of `comfy-table`.

use comfy_table::presets::{NOTHING, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, Color, ContentArrangement};

/// A terminal table honoring the color and Unicode settings.
#[derive(Debug)]
pub struct Table {
    inner: comfy_table::Table,
    colors: bool,
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        let mut inner = comfy_table::Table::new();
        inner
            .load_preset(if super::unicode_enabled() {
                UTF8_FULL_CONDENSED
            } else {
                NOTHING
            })
            .set_content_arrangement(ContentArrangement::Dynamic);
        Self {
            inner,
            colors: super::colors_enabled(),
        }
    }

    /// Set the header row.
    pub fn headers<I, S>(&mut self, headers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let colors = self.colors;
        self.inner.set_header(headers.into_iter().map(|h| {
            let cell = Cell::new(h.into());
            if colors {
                cell.add_attribute(Attribute::Bold).fg(Color::Cyan)
            } else {
                cell
            }
        }));
    }

    /// Add a plain row.
    pub fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner
            .add_row(cells.into_iter().map(|c| Cell::new(c.into())));
    }

    /// Add a row of prepared cells.
    pub fn styled_row(&mut self, cells: Vec<Cell>) {
        self.inner.add_row(cells);
    }

    /// Cell highlighted as good.
    pub fn success_cell(&self, text: &str) -> Cell {
        self.colored(text, Color::Green)
    }

    /// Cell highlighted as a caution.
    pub fn warning_cell(&self, text: &str) -> Cell {
        self.colored(text, Color::Yellow)
    }

    /// Cell rendered dim.
    pub fn dim_cell(&self, text: &str) -> Cell {
        self.colored(text, Color::DarkGrey)
    }

    fn colored(&self, text: &str, color: Color) -> Cell {
        let cell = Cell::new(text);
        if self.colors { cell.fg(color) } else { cell }
    }

    /// Print to stdout.
    pub fn print(&self) {
        println!("{}", self.inner);
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_rows() {
        let mut table = Table::new();
        table.headers(["Id", "URL"]);
        table.row(["central", "https://repo1.maven.org/maven2/"]);
        let cell = table.success_cell("yes");
        table.styled_row(vec![Cell::new("local"), cell]);
        let rendered = table.to_string();
        assert!(rendered.contains("central"));
        assert!(rendered.contains("local"));
    }
}
