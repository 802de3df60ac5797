//! Converter backed by the Python `pdf2docx` package.
//!
//! The package is driven through a small inline runner passed with
//! `python -c`, so nothing has to be installed next to the binary besides the
//! package itself. The runner exits with status 3 when the package cannot be
//! imported, which is reported as an unavailable engine rather than a failed
//! conversion.

use super::{process, ConversionEngine, PageRange};
use crate::error::ConvertError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

const ENGINE: &str = "pdf2docx";

/// Exit status the runner uses when `pdf2docx` is not importable.
const EXIT_NOT_INSTALLED: i32 = 3;

/// argv: input, output, start page, end page ("" = last page).
const RUNNER: &str = r#"
import sys
try:
    from pdf2docx import Converter
except ImportError as exc:
    sys.stderr.write("pdf2docx is not installed: %s\n" % exc)
    sys.exit(3)

src, dst, start, end = sys.argv[1:5]
try:
    cv = Converter(src)
    try:
        cv.convert(dst, start=int(start), end=int(end) if end else None)
    finally:
        cv.close()
except Exception as exc:
    sys.stderr.write("%s\n" % exc)
    sys.exit(1)
"#;

/// Runs `pdf2docx.Converter` over the requested pages.
#[derive(Debug, Clone)]
pub struct Pdf2DocxEngine {
    python_exe: PathBuf,
}

impl Pdf2DocxEngine {
    pub fn new(python_exe: impl AsRef<Path>) -> Self {
        Self {
            python_exe: python_exe.as_ref().to_path_buf(),
        }
    }

    fn command(&self, input: &Path, output: &Path, pages: PageRange) -> Command {
        let mut cmd = Command::new(&self.python_exe);
        cmd.arg("-c")
            .arg(RUNNER)
            .arg(input)
            .arg(output)
            .arg(pages.start.to_string())
            .arg(pages.end.map(|e| e.to_string()).unwrap_or_default());
        cmd
    }
}

#[async_trait]
impl ConversionEngine for Pdf2DocxEngine {
    fn name(&self) -> &'static str {
        ENGINE
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        pages: PageRange,
    ) -> Result<(), ConvertError> {
        info!(
            "pdf2docx: {} → {} (pages {}..{:?})",
            input.display(),
            output.display(),
            pages.start,
            pages.end
        );

        let out = process::spawn(ENGINE, self.command(input, output, pages)).await?;
        match out.status.code() {
            Some(0) => Ok(()),
            Some(EXIT_NOT_INSTALLED) => Err(ConvertError::EngineUnavailable {
                engine: ENGINE,
                detail: format!(
                    "{}\nInstall it with: {} -m pip install pdf2docx",
                    process::failure_detail(&out),
                    self.python_exe.display()
                ),
            }),
            _ => Err(ConvertError::ConversionFailed {
                engine: ENGINE,
                detail: process::failure_detail(&out),
            }),
        }
    }
}
