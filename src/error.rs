//! Error types for the finity-extract library.
//!
//! Two error types reflect the two sides of the extraction boundary:
//!
//! * [`ExtractError`]: everything a request can fail with. Returned as
//!   `Err(ExtractError)` from the top-level `analyze*` functions. A request
//!   that fails never yields a partial result or a partial export.
//!
//! * [`CollaboratorError`]: what an [`crate::extractor::Extractor`]
//!   implementation reports when it cannot process a document. The invoker
//!   wraps it into [`ExtractError::Extraction`] with the message untouched.
//!
//! Only some variants are meant for end users verbatim; see
//! [`ExtractError::user_message`].

use std::path::PathBuf;
use thiserror::Error;

/// Prefix of every user-facing error line.
const USER_PREFIX: &str = "Error processing file";

/// All errors returned by the finity-extract library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Upload boundary ───────────────────────────────────────────────────
    /// The uploaded file's extension is not one of pdf, csv, xlsx, xls.
    #[error("Unsupported file type '{extension}' for '{filename}'\nAccepted: pdf, csv, xlsx, xls.")]
    UnsupportedFormat { filename: String, extension: String },

    /// The upload cannot be staged as given (empty name, directory-only name).
    #[error("Invalid upload '{filename}': {reason}")]
    InvalidUpload { filename: String, reason: String },

    // ── Staging ───────────────────────────────────────────────────────────
    /// Writing or reading the staged document failed.
    #[error("I/O failure on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An internal precondition was violated (e.g. extraction requested on a
    /// path that is not a staged, readable file).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // ── Extraction ────────────────────────────────────────────────────────
    /// The extraction collaborator could not process the document.
    ///
    /// `message` is the collaborator's own text, unchanged.
    #[error("{message}")]
    Extraction { message: String },

    /// The caller-level extraction timeout expired.
    #[error("Extraction did not finish within {secs}s")]
    ExtractionTimedOut { secs: u64 },

    // ── Presentation ──────────────────────────────────────────────────────
    /// The configured presenter could not display the result.
    #[error("Presentation failed: {0}")]
    Presentation(#[from] crate::present::PresentError),

    // ── Export ────────────────────────────────────────────────────────────
    /// The result could not be serialised into the export format.
    #[error("Failed to serialise analysis: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Could not create or write the exported analysis file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation or collaborator resolution failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// Build an [`ExtractError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The single line shown to the person who submitted the document.
    ///
    /// Extraction failures are usually actionable ("file is
    /// password-protected") so their message is passed through. Staging,
    /// state and serialisation failures are internal and collapse to a
    /// generic line; their detail belongs in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Extraction { message } => format!("{USER_PREFIX}: {message}"),
            Self::UnsupportedFormat { .. }
            | Self::InvalidUpload { .. }
            | Self::ExtractionTimedOut { .. }
            | Self::InvalidConfig(_) => {
                let text = self.to_string();
                let first = text.lines().next().unwrap_or_default();
                format!("{USER_PREFIX}: {first}")
            }
            Self::OutputWriteFailed { path, .. } => {
                format!("{USER_PREFIX}: could not write '{}'", path.display())
            }
            Self::Io { .. }
            | Self::InvalidState(_)
            | Self::Presentation(_)
            | Self::Serialization(_)
            | Self::Internal(_) => {
                format!("{USER_PREFIX}: an internal error occurred while processing the document")
            }
        }
    }

    /// `true` when the failure came from the extraction collaborator.
    pub fn is_extraction_failure(&self) -> bool {
        matches!(self, Self::Extraction { .. })
    }
}

/// Failure reported by an extraction collaborator.
///
/// Carries a human-readable message only; collaborators never return a
/// partial structure alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CollaboratorError {
    pub message: String,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<CollaboratorError> for ExtractError {
    fn from(e: CollaboratorError) -> Self {
        ExtractError::Extraction { message: e.message }
    }
}
