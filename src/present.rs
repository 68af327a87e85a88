//! Presenter contract: how a finished result is shown to a person.
//!
//! A [`Presenter`] receives the validated [`ExtractionResult`] by shared
//! reference, so it cannot alter what gets exported afterwards. Every
//! presenter must cope with empty sections, tables without rows, and tables
//! whose rows carry different columns; [`TableGrid`] does the squaring so
//! each presenter does not have to.
//!
//! [`MarkdownPresenter`] writes the report the `finity` CLI prints.
//!
//! # Example
//!
//! ```rust
//! use finity_extract::present::{render_markdown, TableGrid};
//! use finity_extract::ExtractionResult;
//! use serde_json::json;
//!
//! let result = ExtractionResult::from_raw(json!({
//!     "financial_data": [{"table_name": "Mixed", "rows": [{"A": 1}, {"A": 2, "B": 3}]}]
//! }))
//! .unwrap();
//!
//! let grid = TableGrid::from_table(&result.financial_data[0]);
//! assert_eq!(grid.columns, vec!["A", "B"]);
//! assert!(grid.rows[0][1].is_none());
//!
//! let md = render_markdown(&result);
//! assert!(md.contains("### Table: Mixed"));
//! ```

use crate::schema::{page_label, ExtractionResult, FinancialTable};
use serde_json::Value;
use std::fmt::Write as _;
use std::io::Write;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Why a presenter could not display a result.
#[derive(Debug, Error)]
pub enum PresentError {
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Displays one extraction result.
///
/// Implementations must be `Send + Sync`: the configured presenter is shared
/// through [`crate::config::ExtractionConfig`] the same way across requests.
pub trait Presenter: Send + Sync {
    fn present(&self, result: &ExtractionResult) -> Result<(), PresentError>;
}

/// A presenter that shows nothing.
pub struct NoopPresenter;

impl Presenter for NoopPresenter {
    fn present(&self, _result: &ExtractionResult) -> Result<(), PresentError> {
        Ok(())
    }
}

/// Convenience alias matching the type stored in
/// [`crate::config::ExtractionConfig`].
pub type SharedPresenter = Arc<dyn Presenter>;

// ── Tabular view ─────────────────────────────────────────────────────────

/// A table's rows squared into a grid.
///
/// `columns` is the union of every row's keys in first-seen order; a cell is
/// `None` where that row has no such column.
#[derive(Debug, Clone, PartialEq)]
pub struct TableGrid<'a> {
    pub columns: Vec<&'a str>,
    pub rows: Vec<Vec<Option<&'a Value>>>,
}

impl<'a> TableGrid<'a> {
    pub fn from_table(table: &'a FinancialTable) -> Self {
        let columns = table.columns();
        let rows = table
            .rows
            .iter()
            .map(|row| columns.iter().map(|c| row.get(*c)).collect())
            .collect();
        Self { columns, rows }
    }

    /// `true` when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Text shown for one cell. Missing cells and JSON `null` are blank.
pub fn cell_text(cell: Option<&Value>) -> String {
    match cell {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// ── Markdown ─────────────────────────────────────────────────────────────

/// Writes [`render_markdown`] output to a sink (stdout by default).
pub struct MarkdownPresenter {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl MarkdownPresenter {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl Presenter for MarkdownPresenter {
    fn present(&self, result: &ExtractionResult) -> Result<(), PresentError> {
        let md = render_markdown(result);
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| PresentError::Other("output sink poisoned".into()))?;
        sink.write_all(md.as_bytes())?;
        sink.flush()?;
        Ok(())
    }
}

/// Render a result as a Markdown report.
///
/// Metadata is always shown; tables, contextual text and notes only when the
/// engine found any.
pub fn render_markdown(result: &ExtractionResult) -> String {
    let mut out = String::new();

    out.push_str("## Document Metadata\n\n");
    let metadata = serde_json::to_string_pretty(&result.metadata).unwrap_or_else(|_| "{}".into());
    push_fenced(&mut out, "json", &metadata);

    if !result.financial_data.is_empty() {
        out.push_str("\n## Extracted Financial Tables\n");
        for table in &result.financial_data {
            let _ = write!(out, "\n### Table: {}\n\n", table.display_name());
            push_grid(&mut out, &TableGrid::from_table(table));
            let _ = writeln!(out, "\nPage: {}", page_label(table.page));
        }
    }

    if !result.contextual_text.is_empty() {
        out.push_str("\n## Contextual Information\n");
        for block in &result.contextual_text {
            let _ = write!(out, "\n### Contextual Text (Page {})\n\n", page_label(block.page));
            push_fenced(&mut out, "", &block.content);
            let tags: Vec<&str> = block.tags.iter().map(String::as_str).collect();
            let _ = writeln!(out, "\nTags: {}", tags.join(", "));
        }
    }

    if !result.notes.is_empty() {
        out.push_str("\n## Document Notes\n");
        for note in &result.notes {
            let _ = write!(out, "\n**Page {}**:\n\n", page_label(note.page));
            push_fenced(&mut out, "", &note.content);
        }
    }

    out
}

fn push_grid(out: &mut String, grid: &TableGrid<'_>) {
    if grid.is_empty() {
        out.push_str("_No rows extracted._\n");
        return;
    }

    let header: Vec<String> = grid.columns.iter().map(|c| escape_cell(c)).collect();
    let _ = writeln!(out, "| {} |", header.join(" | "));
    let _ = writeln!(out, "|{}", " --- |".repeat(grid.columns.len()));
    for row in &grid.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| escape_cell(&cell_text(*cell)))
            .collect();
        let _ = writeln!(out, "| {} |", cells.join(" | "));
    }
}

/// Keep a cell on one table line.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Fence `body`, using a fence longer than any backtick run inside it.
fn push_fenced(out: &mut String, lang: &str, body: &str) {
    let longest_run = body
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run.max(2) + 1);
    let _ = write!(out, "{fence}{lang}\n{}\n{fence}\n", body.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(v: Value) -> ExtractionResult {
        ExtractionResult::from_raw(v).unwrap()
    }

    #[test]
    fn heterogeneous_rows_leave_blanks() {
        let r = result(json!({
            "financial_data": [{"table_name": "Mixed", "rows": [{"A": 1}, {"A": 2, "B": 3}]}]
        }));
        let grid = TableGrid::from_table(&r.financial_data[0]);
        assert_eq!(grid.columns, vec!["A", "B"]);
        assert_eq!(cell_text(grid.rows[0][0]), "1");
        assert_eq!(cell_text(grid.rows[0][1]), "");
        assert_eq!(cell_text(grid.rows[1][1]), "3");

        let md = render_markdown(&r);
        assert!(md.contains("| A | B |"), "{md}");
        assert!(md.contains("| 1 |  |"), "{md}");
        assert!(md.contains("| 2 | 3 |"), "{md}");
    }

    #[test]
    fn empty_rows_do_not_crash() {
        let r = result(json!({"financial_data": [{"table_name": "Empty", "rows": []}]}));
        let md = render_markdown(&r);
        assert!(md.contains("_No rows extracted._"));
        assert!(md.contains("Page: N/A"));
    }

    #[test]
    fn empty_result_shows_only_metadata() {
        let md = render_markdown(&ExtractionResult::default());
        assert!(md.starts_with("## Document Metadata"));
        assert!(md.contains("```json\n{}\n```"));
        assert!(!md.contains("Financial Tables"));
        assert!(!md.contains("Contextual Information"));
        assert!(!md.contains("Document Notes"));
    }

    #[test]
    fn unnamed_table_and_pages() {
        let r = result(json!({
            "financial_data": [{"page": 7, "rows": [{"Total": "1,204"}]}]
        }));
        let md = render_markdown(&r);
        assert!(md.contains("### Table: Unnamed Table"));
        assert!(md.contains("Page: 7"));
        assert!(md.contains("| 1,204 |"));
    }

    #[test]
    fn text_blocks_and_notes() {
        let r = result(json!({
            "contextual_text": [{"page": 2, "content": "Margins narrowed.", "tags": ["margin", "risk"]}],
            "notes": [{"content": "Figures in USD thousands."}]
        }));
        let md = render_markdown(&r);
        assert!(md.contains("### Contextual Text (Page 2)"));
        assert!(md.contains("```\nMargins narrowed.\n```"));
        assert!(md.contains("Tags: margin, risk"));
        assert!(md.contains("**Page N/A**:\n\n```\nFigures in USD thousands.\n```"));
    }

    #[test]
    fn multi_line_notes_stay_inside_their_fence() {
        let r = result(json!({
            "notes": [{"page": 9, "content": "Restated.\n\n## Not a heading\n| not | a table |"}]
        }));
        let md = render_markdown(&r);
        assert!(
            md.contains("**Page 9**:\n\n```\nRestated.\n\n## Not a heading\n| not | a table |\n```\n"),
            "{md}"
        );
    }

    #[test]
    fn cells_are_escaped() {
        assert_eq!(escape_cell("a|b\nc"), "a\\|b c");
        assert_eq!(cell_text(Some(&json!(null))), "");
        assert_eq!(cell_text(Some(&json!(true))), "true");
        assert_eq!(cell_text(Some(&json!([1, 2]))), "[1,2]");
    }

    #[test]
    fn fence_outgrows_embedded_backticks() {
        let mut out = String::new();
        push_fenced(&mut out, "", "see ```code```");
        assert!(out.starts_with("````\n"), "{out}");
    }

    #[test]
    fn presenter_writes_to_sink() {
        #[derive(Clone, Default)]
        struct Shared(Arc<Mutex<Vec<u8>>>);
        impl Write for Shared {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let buf = Shared::default();
        let presenter = MarkdownPresenter::new(buf.clone());
        presenter.present(&ExtractionResult::default()).unwrap();
        let written = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(written.contains("Document Metadata"));
    }

    #[test]
    fn noop_presenter_does_nothing() {
        let p: SharedPresenter = Arc::new(NoopPresenter);
        p.present(&ExtractionResult::default()).unwrap();
    }
}
