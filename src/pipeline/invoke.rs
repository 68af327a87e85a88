//! Extraction invocation: call the engine once and validate what it returns.
//!
//! The engine is expensive and deterministic enough that a second attempt
//! rarely helps, so there is no retry here. Callers that want retries or a
//! deadline wrap [`invoke`] themselves (see
//! [`crate::config::ExtractionConfig::extraction_timeout_secs`]).

use crate::error::ExtractError;
use crate::extractor::Extractor;
use crate::schema::ExtractionResult;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

/// Run `extractor` on the staged document at `path` and return the
/// validated result.
///
/// # Errors
/// * [`ExtractError::InvalidState`]: `path` is not an existing, readable
///   regular file. This is a broken caller contract, not bad input.
/// * [`ExtractError::Extraction`]: the engine failed (its message is kept
///   verbatim) or returned output that does not fit the schema.
pub async fn invoke(extractor: &dyn Extractor, path: &Path) -> Result<ExtractionResult, ExtractError> {
    check_readable(path).await?;

    let start = Instant::now();
    let raw = extractor.extract(path).await.map_err(|e| {
        info!("Extractor rejected '{}': {}", path.display(), e);
        ExtractError::from(e)
    })?;
    debug!(
        "Extractor returned after {}ms",
        start.elapsed().as_millis()
    );

    let result = ExtractionResult::from_raw(raw)?;
    debug!(
        "Validated result: {} metadata keys, {} tables ({} rows), {} text blocks, {} notes",
        result.metadata.len(),
        result.financial_data.len(),
        result.row_count(),
        result.contextual_text.len(),
        result.notes.len()
    );

    Ok(result)
}

async fn check_readable(path: &Path) -> Result<(), ExtractError> {
    let violation = match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => match tokio::fs::File::open(path).await {
            Ok(_) => return Ok(()),
            Err(e) => format!("staged file '{}' is not readable: {e}", path.display()),
        },
        Ok(_) => format!("staged path '{}' is not a regular file", path.display()),
        Err(e) => format!("staged file '{}' is missing: {e}", path.display()),
    };
    error!("{}", violation);
    Err(ExtractError::InvalidState(violation))
}
