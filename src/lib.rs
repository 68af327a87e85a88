//! # finity-extract
//!
//! Turn one financial document (PDF, CSV, XLS, XLSX) into a structured
//! breakdown: tables, contextual narrative, marginal notes and document
//! metadata.
//!
//! ## Why this crate?
//!
//! Extraction engines (PDF parsers, table detectors, retrieval-augmented
//! classifiers) are slow, loosely typed and prone to partial output. This
//! crate owns everything around them: staging the upload so concurrent
//! requests never collide, calling the engine exactly once, validating its
//! output into a fixed schema, and exporting that schema as stable JSON. The
//! staged copy is deleted on every exit path.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Upload
//!  │
//!  ├─ 1. Intake   reject anything but pdf/csv/xlsx/xls
//!  ├─ 2. Stage    write to <staging>/<unique dir>/<filename>
//!  ├─ 3. Extract  one call to the engine (optional deadline)
//!  ├─ 4. Validate raw JSON → ExtractionResult
//!  ├─ 5. Present  optional Presenter (Markdown in the CLI)
//!  ├─ 6. Export   <filename>_analysis.json
//!  └─ 7. Release  staged copy removed, success or failure
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use finity_extract::{analyze_file, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .extractor_command("python3")
//!         .extractor_arg("-m")
//!         .extractor_arg("finity_engine")
//!         .build()?;
//!     let output = analyze_file("q3_report.pdf", &config).await?;
//!     for table in &output.result.financial_data {
//!         println!("{} ({} rows)", table.display_name(), table.rows.len());
//!     }
//!     std::fs::write(&output.artifact.file_name, &output.artifact.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Plugging in an engine
//!
//! Anything implementing [`Extractor`] can be used; [`CommandExtractor`]
//! runs an external program and reads its JSON from stdout.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `finity` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod extractor;
pub mod output;
pub mod pipeline;
pub mod present;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_file, analyze_sync, analyze_to_dir};
pub use config::{ExtractionConfig, ExtractionConfigBuilder, EXTRACTOR_CMD_ENV};
pub use error::{CollaboratorError, ExtractError};
pub use extractor::{CommandExtractor, Extractor};
pub use output::{AnalysisOutput, AnalysisStats};
pub use pipeline::export::{export, ExportedArtifact, EXPORT_MIME_TYPE};
pub use pipeline::invoke::invoke;
pub use pipeline::staging::{stage, DocumentFormat, StagedFile, Upload};
pub use present::{MarkdownPresenter, NoopPresenter, PresentError, Presenter, TableGrid};
pub use schema::{ExtractionResult, FinancialTable, Note, Row, TextBlock};
