//! CLI binary for finity-extract.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig`, shows the report and writes the export.

use anyhow::{Context, Result};
use clap::Parser;
use finity_extract::present::{MarkdownPresenter, PresentError, Presenter};
use finity_extract::{
    analyze_file, AnalysisOutput, CommandExtractor, ExtractionConfig, ExtractionResult,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Terminal presenter ───────────────────────────────────────────────────────

/// Clears the spinner, then hands the result to a stdout [`MarkdownPresenter`].
struct CliPresenter {
    spinner: Option<ProgressBar>,
    report: MarkdownPresenter,
}

impl CliPresenter {
    fn new(show_spinner: bool) -> Arc<Self> {
        let spinner = show_spinner.then(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            bar.set_prefix("Analyzing");
            bar.set_message("Analyzing document…");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        Arc::new(Self {
            spinner,
            report: MarkdownPresenter::stdout(),
        })
    }

    fn clear(&self) {
        if let Some(ref bar) = self.spinner {
            bar.finish_and_clear();
        }
    }
}

impl Presenter for CliPresenter {
    fn present(&self, result: &ExtractionResult) -> Result<(), PresentError> {
        self.clear();
        self.report.present(result)
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse a filing and print the Markdown report
  finity --extractor-cmd "python3 -m finity_engine" q3_report.pdf

  # Save <file>_analysis.json next to the reports
  finity -o analyses/ statements.xlsx

  # Print only the JSON export
  finity --json revenue.csv > revenue.json

  # Give the engine at most five minutes
  finity --timeout 300 annual_report.pdf

ACCEPTED FORMATS:
  pdf, csv, xlsx, xls

EXTRACTION ENGINE:
  The engine is any program that takes a document path as its last
  argument and prints a JSON object with the optional keys metadata,
  financial_data, contextual_text and notes. A non-zero exit status is a
  failure; its stderr is shown to the user.

ENVIRONMENT VARIABLES:
  FINITY_EXTRACTOR_CMD    Engine command line (e.g. "python3 -m finity_engine")
  FINITY_STAGING_DIR      Where uploads are staged during a request
  RUST_LOG                Override log filtering (e.g. finity_extract=debug)
"#;

/// Extract tables, narrative and notes from financial documents.
#[derive(Parser, Debug)]
#[command(
    name = "finity",
    version,
    about = "Extract tables, narrative and notes from financial documents",
    long_about = "Stage a financial document (PDF, CSV, XLSX, XLS), run an extraction engine \
on it, and show the structured result. The full analysis can be exported as \
<file>_analysis.json.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document to analyse (.pdf, .csv, .xlsx, .xls).
    input: PathBuf,

    /// Write <file>_analysis.json into this directory.
    #[arg(short, long, env = "FINITY_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Print the JSON export on stdout instead of the Markdown report.
    #[arg(long, env = "FINITY_JSON")]
    json: bool,

    /// Extraction engine command line; the document path is appended.
    #[arg(long, env = "FINITY_EXTRACTOR_CMD")]
    extractor_cmd: Option<String>,

    /// Extra argument for the engine, placed before the document path.
    #[arg(long = "extractor-arg", allow_hyphen_values = true)]
    extractor_args: Vec<String>,

    /// Root directory for staged uploads.
    #[arg(long, env = "FINITY_STAGING_DIR")]
    staging_dir: Option<PathBuf>,

    /// Give up on the engine after this many seconds.
    #[arg(long, env = "FINITY_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Disable the spinner.
    #[arg(long, env = "FINITY_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FINITY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FINITY_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let presenter = CliPresenter::new(show_progress);
    let config = build_config(&cli, (!cli.json && !cli.quiet).then(|| Arc::clone(&presenter)))?;

    // ── Run analysis ─────────────────────────────────────────────────────
    let output = match analyze_file(&cli.input, &config).await {
        Ok(output) => output,
        Err(e) => {
            presenter.clear();
            tracing::debug!("analysis failed: {e:?}");
            eprintln!("{} {}", red("✘"), red(&e.user_message()));
            std::process::exit(1);
        }
    };
    presenter.clear();

    if cli.json {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(&output.artifact.bytes)
            .and_then(|_| handle.write_all(b"\n"))
            .context("Failed to write to stdout")?;
    }

    let written = match cli.output_dir {
        Some(ref dir) => match output.artifact.write_to_dir(dir).await {
            Ok(path) => Some(path),
            Err(e) => {
                eprintln!("{} {}", red("✘"), red(&e.user_message()));
                std::process::exit(1);
            }
        },
        None => None,
    };

    if !cli.quiet {
        print_summary(&output, written.as_ref());
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, presenter: Option<Arc<CliPresenter>>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder();

    if let Some(ref dir) = cli.staging_dir {
        builder = builder.staging_dir(dir);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.extraction_timeout_secs(secs);
    }
    if let Some(ref line) = cli.extractor_cmd {
        let extractor = CommandExtractor::from_command_line(line)
            .context("--extractor-cmd must not be empty")?
            .args(cli.extractor_args.iter().cloned());
        builder = builder.extractor(Arc::new(extractor));
    } else if !cli.extractor_args.is_empty() {
        anyhow::bail!("--extractor-arg requires --extractor-cmd");
    }
    if let Some(p) = presenter {
        builder = builder.presenter(p);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(output: &AnalysisOutput, written: Option<&PathBuf>) {
    let s = &output.stats;
    eprintln!(
        "{} {}  {} tables ({} rows)  {} text blocks  {} notes  {}",
        green("✔"),
        bold(&output.source_filename),
        s.table_count,
        s.row_count,
        s.text_block_count,
        s.note_count,
        dim(&format!("{}ms", s.total_duration_ms)),
    );
    if let Some(path) = written {
        eprintln!("   →  {}", bold(&path.display().to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_repeated_engine_args() {
        let cli = Cli::try_parse_from([
            "finity",
            "--extractor-cmd",
            "python3 -m engine",
            "--extractor-arg",
            "--mode",
            "--extractor-arg",
            "rag",
            "report.csv",
        ])
        .unwrap();
        assert_eq!(cli.extractor_args, vec!["--mode", "rag"]);
        assert_eq!(cli.input, PathBuf::from("report.csv"));
    }

    #[test]
    fn presenter_without_spinner_prints_report() {
        let presenter = CliPresenter::new(false);
        assert!(presenter.spinner.is_none());
        presenter.present(&ExtractionResult::default()).unwrap();
    }

    #[test]
    fn presenter_clears_spinner_before_report() {
        let presenter = CliPresenter::new(true);
        presenter.present(&ExtractionResult::default()).unwrap();
        assert!(presenter.spinner.as_ref().is_some_and(|bar| bar.is_finished()));
    }

    #[test]
    fn zero_timeout_is_rejected_by_parser() {
        assert!(Cli::try_parse_from(["finity", "--timeout", "0", "a.pdf"]).is_err());
    }

    #[test]
    fn engine_args_need_a_command() {
        let cli = Cli::try_parse_from(["finity", "--extractor-arg", "x", "a.pdf"]).unwrap();
        if cli.extractor_cmd.is_none() {
            assert!(build_config(&cli, None).is_err());
        }
    }
}
