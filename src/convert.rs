//! Conversion dispatcher: one PDF in, one DOCX out.
//!
//! ```text
//! input ──▶ resolve (path, %PDF check) ──▶ engine (full page range) ──▶ report
//! ```
//!
//! A single attempt is made. Anything the external converter leaves behind on
//! failure is left alone.

use crate::config::ConversionConfig;
use crate::engine::{engine_for, ConversionEngine, PageRange};
use crate::error::ConvertError;
use crate::input;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// What a successful conversion produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    /// The input path as given.
    pub input: String,
    /// Where the DOCX was written.
    pub output: PathBuf,
    /// Engine that did the work.
    pub engine: &'static str,
    /// Size of the written DOCX.
    pub output_bytes: u64,
    /// Wall-clock time including engine start-up.
    pub duration_ms: u64,
}

/// Convert a PDF file to DOCX using the engine named in `config`.
///
/// # Errors
/// - [`ConvertError::MissingInput`] when a local input does not exist; no
///   engine is started and `output` is not touched.
/// - [`ConvertError::ConversionFailed`] when the engine reports an error.
/// - Other input/engine/output variants as documented on [`ConvertError`].
pub async fn convert(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionReport, ConvertError> {
    let engine = engine_for(config);
    convert_with(engine.as_ref(), input_str, output_path, config).await
}

/// Same as [`convert`] with a caller-supplied engine.
pub async fn convert_with(
    engine: &dyn ConversionEngine,
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionReport, ConvertError> {
    let start = Instant::now();
    let input_str = input_str.as_ref();
    let output = output_path.as_ref();
    info!("Starting conversion: {} → {}", input_str, output.display());

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str)?;

    // ── Step 2: Make room for the output ─────────────────────────────────
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ConvertError::OutputWriteFailed {
                path: output.to_path_buf(),
                source: e,
            })?;
    }

    // ── Step 3: Hand the whole document to the engine ────────────────────
    debug!("Using engine {}", engine.name());
    engine
        .convert(&resolved, output, PageRange::full())
        .await?;

    // ── Step 4: Report ───────────────────────────────────────────────────
    let meta = tokio::fs::metadata(output)
        .await
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: output.to_path_buf(),
            source: e,
        })?;

    let report = ConversionReport {
        input: input_str.to_string(),
        output: output.to_path_buf(),
        engine: engine.name(),
        output_bytes: meta.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Conversion complete: {} bytes in {}ms",
        report.output_bytes, report.duration_ms
    );
    Ok(report)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionReport, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, output_path, config))
}
