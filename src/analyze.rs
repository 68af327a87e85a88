//! Request entry points: one upload in, one analysis out.
//!
//! ## Request lifecycle
//!
//! ```text
//! Upload ─▶ boundary check ─▶ stage ─▶ extract ─▶ present ─▶ export
//!                               │                               │
//!                               └──────── release (always) ◀────┘
//! ```
//!
//! The staged file is owned by the request for exactly this span. Whatever
//! step fails, the request returns a single [`ExtractError`] and the staged
//! file is gone by the time the caller sees it.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::extractor::Extractor;
use crate::output::{AnalysisOutput, AnalysisStats};
use crate::pipeline::export::{self, ExportedArtifact};
use crate::pipeline::invoke;
use crate::pipeline::staging::{self, StagedFile, Upload};
use crate::schema::ExtractionResult;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Analyse one uploaded document.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// * [`ExtractError::UnsupportedFormat`] / [`ExtractError::InvalidUpload`]:
///   rejected at the boundary; nothing was staged.
/// * [`ExtractError::InvalidConfig`]: no extraction engine configured.
/// * [`ExtractError::Io`]: the upload could not be staged.
/// * [`ExtractError::Extraction`]: the engine failed or returned unusable
///   output; its message is kept verbatim.
/// * [`ExtractError::ExtractionTimedOut`]: the configured deadline expired.
/// * [`ExtractError::Presentation`] / [`ExtractError::Serialization`]: the
///   result could not be shown or exported.
pub async fn analyze(upload: Upload, config: &ExtractionConfig) -> Result<AnalysisOutput, ExtractError> {
    let total_start = Instant::now();
    info!("Starting analysis: {}", upload.filename);

    // ── Step 1: Boundary check ───────────────────────────────────────────
    let format = upload.format()?;
    if !format.looks_like(&upload.content) {
        debug!(
            "'{}' does not start like a {} file; leaving the verdict to the extractor",
            upload.filename, format
        );
    }

    // ── Step 2: Resolve the engine ───────────────────────────────────────
    let extractor = config.resolve_extractor()?;

    // ── Step 3: Stage ────────────────────────────────────────────────────
    let mut staged = staging::stage(&config.staging_dir, &upload.filename, &upload.content).await?;

    // ── Step 4: Extract, present, export ─────────────────────────────────
    let outcome = process_staged(&staged, extractor.as_ref(), config).await;

    // ── Step 5: Release, whatever happened above ─────────────────────────
    if let Err(e) = staged.release() {
        warn!("Staged copy of '{}' could not be removed: {}", upload.filename, e);
    }

    let (result, artifact, extraction_duration_ms) = outcome.map_err(|e| {
        warn!("Analysis of '{}' failed: {}", upload.filename, e);
        e
    })?;

    let stats = AnalysisStats {
        extraction_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        ..AnalysisStats::for_result(&result, staged.size_bytes())
    };

    info!(
        "Analysis complete: {} tables, {} text blocks, {} notes in {}ms",
        stats.table_count, stats.text_block_count, stats.note_count, stats.total_duration_ms
    );

    Ok(AnalysisOutput {
        source_filename: upload.filename,
        result,
        artifact,
        stats,
    })
}

/// Analyse a document already on local disk.
///
/// The file is read and then staged like any upload, so the engine never
/// sees the caller's original path.
pub async fn analyze_file(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<AnalysisOutput, ExtractError> {
    let path = path.as_ref();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ExtractError::InvalidUpload {
            filename: path.display().to_string(),
            reason: "path has no file name".to_string(),
        })?;

    let content = tokio::fs::read(path)
        .await
        .map_err(|e| ExtractError::io(path, e))?;

    analyze(Upload::new(filename, content), config).await
}

/// Analyse a local document and write the export artifact into `out_dir`.
///
/// Returns the artifact's path and the request stats.
pub async fn analyze_to_dir(
    path: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<(PathBuf, AnalysisStats), ExtractError> {
    let output = analyze_file(path, config).await?;
    let written = output.artifact.write_to_dir(out_dir).await?;
    Ok((written, output.stats))
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally, so it must not be called
/// from inside an async context.
pub fn analyze_sync(upload: Upload, config: &ExtractionConfig) -> Result<AnalysisOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze(upload, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Everything that happens while the staged file exists.
async fn process_staged(
    staged: &StagedFile,
    extractor: &dyn Extractor,
    config: &ExtractionConfig,
) -> Result<(ExtractionResult, ExportedArtifact, u64), ExtractError> {
    let extraction_start = Instant::now();
    let extraction = invoke::invoke(extractor, staged.path());
    let result = match config.extraction_timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), extraction)
            .await
            .map_err(|_| ExtractError::ExtractionTimedOut { secs })??,
        None => extraction.await?,
    };
    let extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;

    if let Some(ref presenter) = config.presenter {
        presenter.present(&result)?;
    }

    let artifact = export::export(&result, staged.origin_filename())?;
    Ok((result, artifact, extraction_duration_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollaboratorError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Arc;

    struct Fixed(Value);

    #[async_trait]
    impl Extractor for Fixed {
        async fn extract(&self, _path: &Path) -> Result<Value, CollaboratorError> {
            Ok(self.0.clone())
        }
    }

    fn config(root: &Path, value: Value) -> ExtractionConfig {
        ExtractionConfig::builder()
            .staging_dir(root)
            .extractor(Arc::new(Fixed(value)))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn unsupported_format_stages_nothing() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path(), json!({}));
        let err = analyze(Upload::new("memo.docx", b"x".to_vec()), &cfg)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat { .. }));
        assert!(!root.path().exists() || std::fs::read_dir(root.path()).unwrap().count() == 0);
    }

    #[tokio::test]
    async fn missing_engine_is_config_error() {
        if std::env::var(crate::config::EXTRACTOR_CMD_ENV).is_ok() {
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let cfg = ExtractionConfig::builder()
            .staging_dir(root.path())
            .build()
            .unwrap();
        let err = analyze(Upload::new("a.csv", b"x".to_vec()), &cfg)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)), "{err}");
    }

    #[tokio::test]
    async fn stats_are_filled() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(
            root.path(),
            json!({"financial_data": [{"rows": [{"Q1": 1}, {"Q1": 2}]}]}),
        );
        let content = b"Q1\n1\n2\n".to_vec();
        let len = content.len() as u64;
        let out = analyze(Upload::new("r.csv", content), &cfg).await.unwrap();
        assert_eq!(out.stats.staged_bytes, len);
        assert_eq!(out.stats.table_count, 1);
        assert_eq!(out.stats.row_count, 2);
        assert_eq!(out.source_filename, "r.csv");
        assert_eq!(out.artifact.file_name, "r.csv_analysis.json");
    }

    #[tokio::test]
    async fn analyze_file_uses_file_name() {
        let root = tempfile::tempdir().unwrap();
        let doc = root.path().join("q3.pdf");
        std::fs::write(&doc, b"%PDF-1.4").unwrap();
        let cfg = config(&root.path().join("stage"), json!({}));

        let out = analyze_file(&doc, &cfg).await.unwrap();
        assert_eq!(out.source_filename, "q3.pdf");
        assert!(doc.exists(), "caller's file must be left alone");
    }

    #[tokio::test]
    async fn analyze_file_missing_is_io() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path(), json!({}));
        let err = analyze_file(root.path().join("nope.csv"), &cfg)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }), "{err}");
    }

    #[test]
    fn sync_wrapper_runs() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path(), json!({"notes": [{"content": "ok"}]}));
        let out = analyze_sync(Upload::new("n.csv", b"x".to_vec()), &cfg).unwrap();
        assert_eq!(out.result.notes.len(), 1);
    }
}
