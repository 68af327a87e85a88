//! Export: serialise a validated result into the downloadable JSON artifact.
//!
//! The artifact is the complete schema, pretty-printed with two-space
//! indentation and keys in the fixed order `metadata`, `financial_data`,
//! `contextual_text`, `notes`. Empty sections are written as `{}` / `[]`
//! rather than omitted, so parsing the artifact back yields the same
//! [`ExtractionResult`].

use crate::error::ExtractError;
use crate::schema::ExtractionResult;
use std::path::{Path, PathBuf};
use tracing::debug;

/// MIME type of every export artifact.
pub const EXPORT_MIME_TYPE: &str = "application/json";

/// Suffix appended to the uploaded filename to name the artifact.
pub const EXPORT_SUFFIX: &str = "_analysis.json";

/// A serialised analysis ready to be offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedArtifact {
    /// Name of the uploaded document the analysis came from.
    pub source_filename: String,
    /// Suggested download name: `<source_filename>_analysis.json`.
    pub file_name: String,
    pub mime_type: &'static str,
    /// UTF-8 JSON.
    pub bytes: Vec<u8>,
}

impl ExportedArtifact {
    /// The artifact as text.
    pub fn as_str(&self) -> &str {
        // Built from `serde_json::to_vec_pretty`, which only emits UTF-8.
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }

    /// Write the artifact into `dir` under its suggested name.
    ///
    /// Uses atomic write (temp file + rename) so readers never observe a
    /// half-written analysis.
    pub async fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ExtractError> {
        let dir = dir.as_ref();
        let path = dir.join(&self.file_name);

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ExtractError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            })?;

        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &self.bytes)
            .await
            .map_err(|e| ExtractError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            })?;

        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(ExtractError::OutputWriteFailed { path, source: e });
        }

        debug!("Wrote analysis to {}", path.display());
        Ok(path)
    }
}

/// Serialise `result` into an [`ExportedArtifact`] named after
/// `original_filename`.
///
/// # Errors
/// [`ExtractError::Serialization`] if a value cannot be represented as JSON.
/// Every value in the schema came out of JSON, so in practice this does not
/// happen.
pub fn export(result: &ExtractionResult, original_filename: &str) -> Result<ExportedArtifact, ExtractError> {
    let bytes = serde_json::to_vec_pretty(result)?;
    Ok(ExportedArtifact {
        source_filename: original_filename.to_string(),
        file_name: suggested_file_name(original_filename),
        mime_type: EXPORT_MIME_TYPE,
        bytes,
    })
}

/// `<original_filename>_analysis.json`, using only the last path component.
pub fn suggested_file_name(original_filename: &str) -> String {
    let base = original_filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_filename);
    format!("{base}{EXPORT_SUFFIX}")
}
