//! Configuration for an extraction request.
//!
//! All request behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. One config is typically built at
//! start-up and shared by every request: it holds where uploads are staged,
//! which extraction engine runs, and who displays the result.

use crate::error::ExtractError;
use crate::extractor::{CommandExtractor, Extractor};
use crate::present::SharedPresenter;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable holding the engine command line, used when neither
/// a pre-built extractor nor a command is configured.
pub const EXTRACTOR_CMD_ENV: &str = "FINITY_EXTRACTOR_CMD";

/// Name of the default staging directory under the system temp dir.
const DEFAULT_STAGING_DIR: &str = "finity-staging";

/// Configuration for financial document extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use finity_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .staging_dir("/var/tmp/finity")
///     .extractor_command("python3")
///     .extractor_arg("-m")
///     .extractor_arg("finity_engine")
///     .extraction_timeout_secs(300)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Root under which each request gets its own staging directory.
    /// Default: `<system temp>/finity-staging`.
    pub staging_dir: PathBuf,

    /// Pre-constructed extraction engine. Takes precedence over
    /// `extractor_command`.
    pub extractor: Option<Arc<dyn Extractor>>,

    /// Program run by a [`CommandExtractor`] when `extractor` is None.
    /// If None too, [`EXTRACTOR_CMD_ENV`] is consulted.
    pub extractor_command: Option<String>,

    /// Arguments placed before the document path for `extractor_command`.
    pub extractor_args: Vec<String>,

    /// Deadline for the extraction call, in seconds. Default: None.
    ///
    /// Document parsing and model-based classification can take minutes on
    /// large filings, and no single value fits every engine, so there is no
    /// deadline unless the caller sets one.
    pub extraction_timeout_secs: Option<u64>,

    /// Displays each result before it is exported. Default: None.
    pub presenter: Option<SharedPresenter>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            staging_dir: std::env::temp_dir().join(DEFAULT_STAGING_DIR),
            extractor: None,
            extractor_command: None,
            extractor_args: Vec::new(),
            extraction_timeout_secs: None,
            presenter: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("staging_dir", &self.staging_dir)
            .field("extractor", &self.extractor.as_ref().map(|_| "<dyn Extractor>"))
            .field("extractor_command", &self.extractor_command)
            .field("extractor_args", &self.extractor_args)
            .field("extraction_timeout_secs", &self.extraction_timeout_secs)
            .field("presenter", &self.presenter.as_ref().map(|_| "<dyn Presenter>"))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve the extraction engine, from most-specific to least-specific:
    ///
    /// 1. **Pre-built extractor** (`extractor`): used as-is.
    /// 2. **Configured command** (`extractor_command` + `extractor_args`).
    /// 3. **Environment** ([`EXTRACTOR_CMD_ENV`]): a whitespace-separated
    ///    command line.
    pub fn resolve_extractor(&self) -> Result<Arc<dyn Extractor>, ExtractError> {
        if let Some(ref extractor) = self.extractor {
            return Ok(Arc::clone(extractor));
        }

        if let Some(ref program) = self.extractor_command {
            let cmd = CommandExtractor::new(program).args(self.extractor_args.iter().cloned());
            return Ok(Arc::new(cmd));
        }

        if let Ok(line) = std::env::var(EXTRACTOR_CMD_ENV) {
            if let Some(cmd) = CommandExtractor::from_command_line(&line) {
                return Ok(Arc::new(cmd));
            }
        }

        Err(ExtractError::InvalidConfig(format!(
            "no extraction engine configured.\n\
             Pass --extractor-cmd, set {EXTRACTOR_CMD_ENV}, or provide an Extractor."
        )))
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.staging_dir = dir.into();
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn extractor_command(mut self, program: impl Into<String>) -> Self {
        self.config.extractor_command = Some(program.into());
        self
    }

    pub fn extractor_arg(mut self, arg: impl Into<String>) -> Self {
        self.config.extractor_args.push(arg.into());
        self
    }

    pub fn extraction_timeout_secs(mut self, secs: u64) -> Self {
        self.config.extraction_timeout_secs = Some(secs);
        self
    }

    pub fn presenter(mut self, presenter: SharedPresenter) -> Self {
        self.config.presenter = Some(presenter);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.extraction_timeout_secs == Some(0) {
            return Err(ExtractError::InvalidConfig(
                "extraction timeout must be ≥ 1 second".into(),
            ));
        }
        if c.staging_dir.as_os_str().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "staging directory must not be empty".into(),
            ));
        }
        if let Some(ref program) = c.extractor_command {
            if program.trim().is_empty() {
                return Err(ExtractError::InvalidConfig(
                    "extractor command must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
