//! Output types returned by the `analyze*` entry points.

use crate::pipeline::export::ExportedArtifact;
use crate::schema::ExtractionResult;
use serde::{Deserialize, Serialize};

/// Everything one successful request produced.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    /// Filename as uploaded.
    pub source_filename: String,
    /// The validated extraction result.
    pub result: ExtractionResult,
    /// The result serialised for download.
    pub artifact: ExportedArtifact,
    pub stats: AnalysisStats,
}

/// Counters and timings for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Size of the staged upload.
    pub staged_bytes: u64,
    pub metadata_keys: usize,
    pub table_count: usize,
    /// Rows across all tables.
    pub row_count: usize,
    pub text_block_count: usize,
    pub note_count: usize,
    /// Wall-clock time spent inside the extraction engine.
    pub extraction_duration_ms: u64,
    /// Wall-clock time for the whole request, staging to release.
    pub total_duration_ms: u64,
}

impl AnalysisStats {
    /// Counters derived from `result`; timings are left at zero.
    pub fn for_result(result: &ExtractionResult, staged_bytes: u64) -> Self {
        Self {
            staged_bytes,
            metadata_keys: result.metadata.len(),
            table_count: result.financial_data.len(),
            row_count: result.row_count(),
            text_block_count: result.contextual_text.len(),
            note_count: result.notes.len(),
            ..Default::default()
        }
    }
}
