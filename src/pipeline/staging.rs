//! Intake: check an upload at the boundary and stage it on disk.
//!
//! ## Why stage to disk at all?
//!
//! Extraction engines want a file-system path. They open the file themselves,
//! sniff its format and may read it several times. The upload therefore gets
//! written to a request-scoped directory for the lifetime of one request.
//!
//! ## Why a directory per request?
//!
//! Deriving the path from the uploaded filename alone lets two concurrent
//! uploads of `report.pdf` overwrite each other. Each [`StagedFile`] lives in
//! its own uniquely-named [`TempDir`] under the staging root, keeping the
//! original filename (engines use the extension) without sharing a path.
//! Dropping the `StagedFile` deletes the directory, so cleanup happens on
//! every exit path, including early `?` returns and panics.

use crate::error::ExtractError;
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Prefix of every per-request staging directory.
const REQUEST_DIR_PREFIX: &str = "req-";

/// How much of a CSV upload is checked for valid UTF-8.
const CSV_SNIFF_LEN: usize = 512;

/// Document formats accepted at the upload boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Csv,
    Xlsx,
    Xls,
}

impl DocumentFormat {
    /// Every accepted format, in the order they are listed to users.
    pub const ACCEPTED: [DocumentFormat; 4] = [
        DocumentFormat::Pdf,
        DocumentFormat::Csv,
        DocumentFormat::Xlsx,
        DocumentFormat::Xls,
    ];

    /// Detect the format from a filename's extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        Self::ACCEPTED
            .into_iter()
            .find(|f| f.extension() == extension)
            .ok_or_else(|| ExtractError::UnsupportedFormat {
                filename: filename.to_string(),
                extension,
            })
    }

    /// Canonical lowercase extension.
    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Csv => "csv",
            DocumentFormat::Xlsx => "xlsx",
            DocumentFormat::Xls => "xls",
        }
    }

    /// Whether `content` starts the way this format usually does.
    ///
    /// Only used for a diagnostic log line; the engine is the authority on
    /// whether it can read the file.
    pub fn looks_like(self, content: &[u8]) -> bool {
        match self {
            DocumentFormat::Pdf => content.starts_with(b"%PDF"),
            DocumentFormat::Xlsx => content.starts_with(b"PK\x03\x04"),
            DocumentFormat::Xls => content.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]),
            DocumentFormat::Csv => {
                let head = &content[..content.len().min(CSV_SNIFF_LEN)];
                // A character cut in half at the window edge is still text.
                match std::str::from_utf8(head) {
                    Ok(_) => true,
                    Err(e) => e.error_len().is_none(),
                }
            }
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One uploaded document, as received at the boundary.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Boundary check: the format implied by the filename, or
    /// [`ExtractError::UnsupportedFormat`].
    pub fn format(&self) -> Result<DocumentFormat, ExtractError> {
        DocumentFormat::from_filename(&self.filename)
    }
}

/// An uploaded document written to request-scoped storage.
///
/// The file (and its request directory) is removed by [`StagedFile::release`]
/// or, failing that, when the value is dropped.
pub struct StagedFile {
    origin: String,
    path: PathBuf,
    size_bytes: u64,
    /// `None` once released.
    dir: Option<TempDir>,
}

impl StagedFile {
    /// The filename as uploaded (before reduction to a base name).
    pub fn origin_filename(&self) -> &str {
        &self.origin
    }

    /// Absolute path of the staged document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Whether the staged document is currently on disk.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Delete the staged document and its request directory.
    ///
    /// Idempotent: releasing twice, or after the file vanished, is `Ok`.
    pub fn release(&mut self) -> Result<(), ExtractError> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        let dir_path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => {
                debug!("Released staged file: {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ExtractError::io(dir_path, e)),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("Failed to release staged file: {}", e);
        }
    }
}

impl fmt::Debug for StagedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedFile")
            .field("origin", &self.origin)
            .field("path", &self.path)
            .field("size_bytes", &self.size_bytes)
            .field("released", &self.dir.is_none())
            .finish()
    }
}

/// Write `content` to a fresh request directory under `root`.
///
/// The stored name is the last path component of `filename`, so an upload
/// called `../../etc/passwd` is staged as `passwd` inside its own directory.
///
/// # Errors
/// * [`ExtractError::InvalidUpload`]: `filename` has no usable base name.
/// * [`ExtractError::Io`]: the staging root cannot be created or written;
///   anything written before the failure is removed.
pub async fn stage(root: &Path, filename: &str, content: &[u8]) -> Result<StagedFile, ExtractError> {
    let base = base_name(filename).ok_or_else(|| ExtractError::InvalidUpload {
        filename: filename.to_string(),
        reason: "filename has no usable name component".to_string(),
    })?;

    tokio::fs::create_dir_all(root)
        .await
        .map_err(|e| ExtractError::io(root, e))?;

    let dir = tempfile::Builder::new()
        .prefix(REQUEST_DIR_PREFIX)
        .tempdir_in(root)
        .map_err(|e| ExtractError::io(root, e))?;
    let path = dir.path().join(base);

    // On failure `dir` is dropped here, taking any partial write with it.
    tokio::fs::write(&path, content)
        .await
        .map_err(|e| ExtractError::io(&path, e))?;

    debug!(
        "Staged '{}' ({} bytes) at {}",
        filename,
        content.len(),
        path.display()
    );

    Ok(StagedFile {
        origin: filename.to_string(),
        path,
        size_bytes: content.len() as u64,
        dir: Some(dir),
    })
}

/// Last path component of an uploaded name, accepting both separators.
fn base_name(filename: &str) -> Option<&str> {
    let last = filename.rsplit(['/', '\\']).next()?.trim();
    match last {
        "" | "." | ".." => None,
        name => Some(name),
    }
}
