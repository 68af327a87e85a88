//! The extraction result schema.
//!
//! An extraction engine returns loosely-shaped JSON whose quality varies with
//! the document. [`ExtractionResult::from_raw`] is the one place that output
//! is validated: anything that gets past it has the fixed shape below, with
//! explicit optionality per field, and the rest of the crate never touches
//! untyped data again.
//!
//! ```text
//! ExtractionResult
//!  ├─ metadata         { key → any JSON value }
//!  ├─ financial_data   [ FinancialTable { table_name?, page?, rows[] } ]
//!  ├─ contextual_text  [ TextBlock { page?, content, tags[] } ]
//!  └─ notes            [ Note { page?, content } ]
//! ```
//!
//! Missing and `null` fields both mean "no data of that kind". Rows are kept
//! as the engine produced them; two rows of one table may carry different
//! columns. Squaring them into a grid is a presentation concern, see
//! [`crate::present::TableGrid`].

use crate::error::ExtractError;
use indexmap::IndexSet;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One table row: column name → cell value, in extraction order.
pub type Row = Map<String, Value>;

/// Label used for tables the engine did not name.
pub const UNNAMED_TABLE: &str = "Unnamed Table";

/// Validated output of one extraction.
///
/// Field order here is the export key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Document-level facts (page count, detected type, …). May be empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Map<String, Value>,

    /// Tables in the order the engine returned them.
    #[serde(default, deserialize_with = "null_as_default")]
    pub financial_data: Vec<FinancialTable>,

    /// Narrative passages that give the tables context.
    #[serde(default, deserialize_with = "null_as_default")]
    pub contextual_text: Vec<TextBlock>,

    /// Marginal annotations and footnotes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: Vec<Note>,
}

/// A table of financial figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialTable {
    #[serde(default)]
    pub table_name: Option<String>,

    /// 1-indexed source page, when the engine knows it.
    #[serde(default)]
    pub page: Option<i64>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub rows: Vec<Row>,
}

/// A passage of narrative text with classification tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub page: Option<i64>,

    pub content: String,

    /// Tag set in first-seen order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: IndexSet<String>,
}

/// A marginal note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub page: Option<i64>,

    pub content: String,
}

impl ExtractionResult {
    /// Validate raw engine output into the fixed schema.
    ///
    /// * A `null` document is an empty result.
    /// * Anything other than an object, or a present field of the wrong
    ///   shape, is reported as [`ExtractError::Extraction`]; nothing is
    ///   partially populated.
    /// * Unknown top-level keys are ignored.
    pub fn from_raw(raw: Value) -> Result<Self, ExtractError> {
        if raw.is_null() {
            return Ok(Self::default());
        }
        if !raw.is_object() {
            return Err(ExtractError::Extraction {
                message: format!(
                    "malformed extraction output: expected a JSON object, got {}",
                    json_kind(&raw)
                ),
            });
        }
        serde_json::from_value(raw).map_err(|e| ExtractError::Extraction {
            message: format!("malformed extraction output: {e}"),
        })
    }

    /// `true` when the engine found nothing at all.
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
            && self.financial_data.is_empty()
            && self.contextual_text.is_empty()
            && self.notes.is_empty()
    }

    /// Total number of rows across every table.
    pub fn row_count(&self) -> usize {
        self.financial_data.iter().map(|t| t.rows.len()).sum()
    }
}

impl FinancialTable {
    /// The table's name, or [`UNNAMED_TABLE`].
    pub fn display_name(&self) -> &str {
        self.table_name.as_deref().unwrap_or(UNNAMED_TABLE)
    }

    /// Union of the column names of every row, in first-seen order.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for key in self.rows.iter().flat_map(|row| row.keys()) {
            if !columns.contains(&key.as_str()) {
                columns.push(key.as_str());
            }
        }
        columns
    }
}

impl TextBlock {
    /// Tag membership; order does not matter.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Render an optional page number the way every presenter shows it.
pub fn page_label(page: Option<i64>) -> String {
    match page {
        Some(p) => p.to_string(),
        None => "N/A".to_string(),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Treat an explicit `null` exactly like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
