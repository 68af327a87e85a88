//! The extraction collaborator seam.
//!
//! Content extraction (PDF parsing, table detection, classification of
//! financial passages) is not done by this crate. It is delegated to an
//! [`Extractor`]: one capability, "given a path, produce raw output or fail".
//! Swapping engines (a different backend, a format-specific tool, a fake in
//! tests) means providing another implementation; the orchestration and the
//! schema never change.
//!
//! [`CommandExtractor`] bridges to an engine that runs as its own process and
//! prints its JSON result on stdout.

use crate::error::CollaboratorError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// An external extraction engine.
///
/// Implementations receive the absolute path of a staged, readable document
/// and return the engine's raw output, a JSON object with any subset of the
/// keys `metadata`, `financial_data`, `contextual_text` and `notes`. On
/// failure they return a human-readable message and no partial output.
///
/// The engine is called once per request and may take arbitrarily long.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<Value, CollaboratorError>;
}

/// An [`Extractor`] that runs an external program.
///
/// The program is invoked as `<program> <args…> <path>`. A zero exit status
/// means stdout holds the JSON result; any other status is a failure whose
/// message is the program's trimmed stderr.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
}

impl CommandExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument placed before the document path.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Parse a whitespace-separated command line such as
    /// `"python3 -m finity_engine"`. Returns `None` for a blank line.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program).args(parts))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl Extractor for CommandExtractor {
    async fn extract(&self, path: &Path) -> Result<Value, CollaboratorError> {
        debug!("Running extractor: {} {:?} {}", self.program, self.args, path.display());

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                CollaboratorError::new(format!("failed to run extractor '{}': {e}", self.program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let message = if stderr.is_empty() {
                format!("extractor '{}' exited with {}", self.program, output.status)
            } else {
                stderr.to_string()
            };
            return Err(CollaboratorError::new(message));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            CollaboratorError::new(format!("extractor '{}' printed invalid JSON: {e}", self.program))
        })
    }
}
