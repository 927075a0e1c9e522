// Plain-text tables for the list commands.
//
// Columns have a fixed display width except the last one, which is printed
// as-is. Every fixed-width cell goes through `cutfill` so rows line up with
// the header regardless of the data.

use std::io::{self, Write};

const RULE_WIDTH: usize = 71;

/// Fit `s` to exactly `width` characters: cut long values to `width - 2`
/// characters followed by `..`, pad short ones with trailing spaces.
pub fn cutfill(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len > width {
        if width < 2 {
            return ".".repeat(width);
        }
        let mut out: String = s.chars().take(width - 2).collect();
        out.push_str("..");
        out
    } else {
        let mut out = String::with_capacity(s.len() + (width - len));
        out.push_str(s);
        out.extend(std::iter::repeat(' ').take(width - len));
        out
    }
}

/// A column header and its display width. `None` leaves the column unpadded.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub header: &'static str,
    pub width: Option<usize>,
}

impl Column {
    pub const fn fixed(header: &'static str, width: usize) -> Self {
        Column {
            header,
            width: Some(width),
        }
    }

    pub const fn free(header: &'static str) -> Self {
        Column {
            header,
            width: None,
        }
    }

    fn render(&self, value: &str) -> String {
        match self.width {
            Some(w) => cutfill(value, w),
            None => value.to_string(),
        }
    }
}

pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: &[Column]) -> Self {
        Table {
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Cells beyond the declared columns are dropped, missing
    /// cells render empty.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn format_line<'a>(&self, cells: impl Iterator<Item = &'a str>) -> String {
        let mut cells = cells;
        self.columns
            .iter()
            .map(|col| col.render(cells.next().unwrap_or("")))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    fn rule_width(&self) -> usize {
        let fixed: usize = self.columns.iter().filter_map(|c| c.width).sum();
        let separators = 3 * self.columns.len().saturating_sub(1);
        RULE_WIDTH.max(fixed + separators + 16)
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let rule = "-".repeat(self.rule_width());
        writeln!(out, "{rule}")?;
        writeln!(
            out,
            "{}",
            self.format_line(self.columns.iter().map(|c| c.header))
        )?;
        writeln!(out, "{rule}")?;
        for row in &self.rows {
            writeln!(out, "{}", self.format_line(row.iter().map(String::as_str)))?;
        }
        writeln!(out, "{rule}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutfill_pads_short_values() {
        assert_eq!(cutfill("abc", 6), "abc   ");
        assert_eq!(cutfill("", 3), "   ");
    }

    #[test]
    fn cutfill_keeps_exact_fit() {
        assert_eq!(cutfill("abcdef", 6), "abcdef");
    }

    #[test]
    fn cutfill_truncates_with_marker() {
        let name = "A very long model name exceeding thirty chars";
        let out = cutfill(name, 30);
        assert_eq!(out.chars().count(), 30);
        assert!(out.ends_with(".."));
        assert_eq!(&out[..28], &name[..28]);
    }

    #[test]
    fn cutfill_width_invariant_holds_for_all_small_widths() {
        let inputs = ["", "a", "ab", "abc", "héllo wörld", "0123456789abcdef"];
        for s in inputs {
            for w in 0..20 {
                let out = cutfill(s, w);
                assert_eq!(out.chars().count(), w, "input {s:?} width {w}");
                let len = s.chars().count();
                if len <= w {
                    assert!(out.starts_with(s));
                    assert!(out[s.len()..].chars().all(|c| c == ' '));
                } else if w >= 2 {
                    assert!(out.ends_with(".."));
                    let head: String = s.chars().take(w - 2).collect();
                    assert!(out.starts_with(&head));
                }
            }
        }
    }

    #[test]
    fn cutfill_counts_characters_not_bytes() {
        assert_eq!(cutfill("ééé", 4), "ééé ");
        assert_eq!(cutfill("éééééé", 4), "éé..");
    }

    #[test]
    fn renders_rows_in_order() {
        let mut table = Table::new(&[Column::fixed("Name:", 6), Column::free("ID:")]);
        table.push_row(["first", "1"]);
        table.push_row(["second-long", "2"]);
        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].chars().all(|c| c == '-'));
        assert_eq!(lines[1], "Name:  | ID:");
        assert_eq!(lines[3], "first  | 1");
        assert_eq!(lines[4], "seco.. | 2");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn missing_cells_render_empty() {
        let mut table = Table::new(&[Column::fixed("A", 3), Column::free("B")]);
        table.push_row(["x"]);
        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().any(|l| l == "x   | "));
    }
}
