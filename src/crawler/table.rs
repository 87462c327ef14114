//! Table linearization
//!
//! Tables in article bodies are rewritten as fixed-width text blocks so they
//! stay readable in a monospace plain-text view. Column widths use a coarse
//! East-Asian approximation: any character above U+007F counts as two columns,
//! everything else as one. Some wide-but-Latin characters come out misaligned;
//! stored articles already depend on this exact layout, so it stays as is.

use crate::crawler::selectors::visible_text;
use scraper::{ElementRef, Selector};

/// Spaces added after every cell beyond its column's widest entry
pub const CELL_GAP: usize = 4;

/// Display width of a string: 2 per non-ASCII char, 1 otherwise
pub fn visual_width(s: &str) -> usize {
    s.chars().map(|c| if (c as u32) > 127 { 2 } else { 1 }).sum()
}

/// Collects the trimmed cell text of every row in a table
///
/// Rows and cells are found at any depth, so cells of nested tables are
/// included in the row that contains them.
pub fn table_rows(table: ElementRef<'_>) -> Vec<Vec<String>> {
    let (Ok(row_selector), Ok(cell_selector)) = (Selector::parse("tr"), Selector::parse("td, th"))
    else {
        return Vec::new();
    };

    table
        .select(&row_selector)
        .map(|row| {
            row.select(&cell_selector)
                .map(|cell| visible_text(cell, ""))
                .collect()
        })
        .collect()
}

/// Renders rows as an aligned text block
///
/// Each cell is followed by `column width - cell width + 4` spaces and every
/// line is right-trimmed. Ragged rows are fine: a short row simply has no
/// cells at the missing columns. The block starts and ends with a newline;
/// no rows renders as an empty string.
pub fn render_table(rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut column_widths = vec![0usize; column_count];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            column_widths[i] = column_widths[i].max(visual_width(cell));
        }
    }

    let lines: Vec<String> = rows
        .iter()
        .map(|row| {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate() {
                let padding = column_widths[i] - visual_width(cell) + CELL_GAP;
                line.push_str(cell);
                line.push_str(&" ".repeat(padding));
            }
            line.trim_end().to_string()
        })
        .collect();

    format!("\n{}\n", lines.join("\n"))
}

/// Extracts and renders a table element in one step
pub fn linearize_table(table: ElementRef<'_>) -> String {
    render_table(&table_rows(table))
}
