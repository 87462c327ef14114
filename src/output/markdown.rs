//! Markdown listing generation
//!
//! Renders the article list as one markdown document: a header with the last
//! crawl time, then one section per article. Article bodies are plain text;
//! lines that belong to a linearized table are wrapped in a code fence so the
//! column alignment survives rendering.

use crate::crawler::table::CELL_GAP;
use crate::output::{ArticleView, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown listing to `output_path`
///
/// # Arguments
///
/// * `view` - The loaded article view
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the listing
/// * `Err(OutputError)` - Failed to write the file
pub fn write_markdown_listing(view: &ArticleView, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_listing(view);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats the article view as markdown
pub fn format_markdown_listing(view: &ArticleView) -> String {
    let mut md = String::new();

    md.push_str("# Announcements\n\n");
    match &view.latest_crawl_time {
        Some(time) => md.push_str(&format!("- **Last Crawl**: {}\n", time)),
        None => md.push_str("- **Last Crawl**: never\n"),
    }
    md.push_str(&format!("- **Articles**: {}\n\n", view.articles.len()));

    if view.articles.is_empty() {
        md.push_str("No announcements stored yet.\n");
        return md;
    }

    for article in &view.articles {
        md.push_str("---\n\n");
        md.push_str(&format!("## {}\n\n", article.title));
        md.push_str(&format!("- **Link**: <{}>\n", article.link));
        md.push_str(&format!("- **Published**: {}\n", article.publish_date));
        md.push_str(&format!("- **Crawled**: {}\n\n", article.crawled_at));
        md.push_str(&format_body(&article.content));
        md.push('\n');
    }

    md
}

/// Returns true for lines with a column gap, i.e. candidate rows of a rendered table
fn is_table_line(line: &str) -> bool {
    line.contains(&" ".repeat(CELL_GAP))
}

/// Renders body text: one paragraph per line, table rows fenced together
///
/// Only runs of at least two gapped lines count as a table; a single line with
/// wide spacing stays a paragraph.
fn format_body(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < lines.len() {
        let run = lines[i..]
            .iter()
            .take_while(|line| is_table_line(line))
            .count();

        if run >= 2 {
            out.push_str("```text\n");
            for line in &lines[i..i + run] {
                out.push_str(line);
                out.push('\n');
            }
            out.push_str("```\n\n");
            i += run;
        } else {
            out.push_str(lines[i]);
            out.push_str("\n\n");
            i += 1;
        }
    }

    out
}
