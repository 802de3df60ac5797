//! CLI binary: convert one PDF to DOCX.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, runs a single conversion and reports the outcome
//! through the exit status (0 success, 1 anything else).

use anyhow::Result;
use clap::Parser;
use docbridge::{convert, ConversionConfig, ConversionReport, ConvertError, EngineKind};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert with the default engine (Python pdf2docx)
  convert report.pdf report.docx

  # Use LibreOffice instead
  convert --engine libreoffice report.pdf out/report.docx

  # Use a specific interpreter (e.g. a virtualenv with pdf2docx installed)
  convert --python .venv/bin/python report.pdf report.docx

EXIT STATUS:
  0  conversion successful
  1  missing input, bad arguments, or the converter failed

SETUP:
  pdf2docx engine:     python3 -m pip install pdf2docx
  libreoffice engine:  install LibreOffice and make sure `soffice` is on PATH
"#;

/// Convert a PDF file to a Word document.
#[derive(Parser, Debug)]
#[command(
    name = "convert",
    version,
    about = "Convert a PDF file to DOCX",
    long_about = "Convert a local PDF document to an editable DOCX file using \
an external converter: the Python pdf2docx package (default) or headless LibreOffice.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: String,

    /// Path of the DOCX file to write (parent directories are created).
    output: PathBuf,

    /// Conversion engine.
    #[arg(long, env = "DOCBRIDGE_ENGINE", value_enum, default_value = "pdf2docx")]
    engine: EngineArg,

    /// Python interpreter used by the pdf2docx engine.
    #[arg(long, env = "DOCBRIDGE_PYTHON", default_value = "python3")]
    python: PathBuf,

    /// LibreOffice executable used by the libreoffice engine.
    #[arg(long, env = "DOCBRIDGE_SOFFICE", default_value = "soffice")]
    soffice: PathBuf,

    /// Disable the spinner.
    #[arg(long, env = "DOCBRIDGE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCBRIDGE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except the result line and errors.
    #[arg(short, long, env = "DOCBRIDGE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EngineArg {
    Pdf2docx,
    Libreoffice,
}

impl From<EngineArg> for EngineKind {
    fn from(v: EngineArg) -> Self {
        match v {
            EngineArg::Pdf2docx => EngineKind::Pdf2Docx,
            EngineArg::Libreoffice => EngineKind::LibreOffice,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap exits with 2 on usage errors; this tool reports every
            // failure as 1. `--help` / `--version` still exit 0.
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs; verbose mode shows everything.
    let show_progress = !cli.quiet && !cli.no_progress;
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

    match run(&cli, show_progress).await {
        Ok(report) => {
            println!("Conversion successful");
            if !cli.quiet {
                eprintln!(
                    "{}  {}  {}",
                    green("✔"),
                    report.output.display(),
                    dim(&format!(
                        "{} bytes via {} in {}ms",
                        report.output_bytes, report.engine, report.duration_ms
                    )),
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<ConvertError>() {
                Some(missing @ ConvertError::MissingInput { .. }) => eprintln!("Error: {missing}"),
                _ => eprintln!("Conversion failed: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<ConversionReport> {
    let config = build_config(cli)?;

    let spinner = show_progress.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Converting");
        bar.set_message(format!("{} ({})", cli.input, config.engine.as_str()));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let result = convert(&cli.input, &cli.output, &config).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    Ok(result?)
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let config = ConversionConfig::builder()
        .engine(cli.engine.into())
        .python_exe(&cli.python)
        .soffice_exe(&cli.soffice)
        .build()?;
    Ok(config)
}
