//! Converter backed by LibreOffice in headless mode.
//!
//! `soffice` cannot write to an arbitrary output file name: it writes
//! `<input stem>.docx` into `--outdir`. The conversion therefore goes into a
//! scratch directory next to the requested output, and the result is renamed
//! into place. Each run also gets its own user profile so concurrent
//! conversions do not fight over the profile lock.

use super::{process, ConversionEngine, PageRange};
use crate::error::ConvertError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{info, warn};

const ENGINE: &str = "libreoffice";

/// Runs `soffice --headless --convert-to docx` with the Writer PDF import filter.
#[derive(Debug, Clone)]
pub struct LibreOfficeEngine {
    soffice_exe: PathBuf,
}

impl LibreOfficeEngine {
    pub fn new(soffice_exe: impl AsRef<Path>) -> Self {
        Self {
            soffice_exe: soffice_exe.as_ref().to_path_buf(),
        }
    }

    fn command(&self, input: &Path, out_dir: &Path, profile_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.soffice_exe);
        cmd.arg(format!("-env:UserInstallation=file://{}", profile_dir.display()))
            .arg("--headless")
            .arg("--norestore")
            .arg("--infilter=writer_pdf_import")
            .arg("--convert-to")
            .arg("docx:MS Word 2007 XML")
            .arg("--outdir")
            .arg(out_dir)
            .arg(input);
        cmd
    }
}

/// Name LibreOffice gives the converted file inside `--outdir`.
fn produced_name(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "output".into());
    let mut name = PathBuf::from(stem);
    name.set_extension("docx");
    name
}

#[async_trait]
impl ConversionEngine for LibreOfficeEngine {
    fn name(&self) -> &'static str {
        ENGINE
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        pages: PageRange,
    ) -> Result<(), ConvertError> {
        if !pages.is_full() {
            return Err(ConvertError::ConversionFailed {
                engine: ENGINE,
                detail: "page ranges are not supported; only whole documents".into(),
            });
        }
        info!("libreoffice: {} → {}", input.display(), output.display());

        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let scratch = tempfile::Builder::new()
            .prefix(".docbridge-")
            .tempdir_in(&parent)
            .map_err(|e| ConvertError::OutputWriteFailed {
                path: output.to_path_buf(),
                source: e,
            })?;
        let out_dir = scratch.path().join("out");
        let profile_dir = scratch.path().join("profile");

        let run = process::run(ENGINE, self.command(input, &out_dir, &profile_dir)).await?;

        // soffice exits 0 even when the import filter rejects the file.
        let produced = out_dir.join(produced_name(input));
        if !produced.exists() {
            let detail = process::failure_detail(&run);
            warn!("libreoffice produced no file: {}", detail);
            return Err(ConvertError::ConversionFailed {
                engine: ENGINE,
                detail: format!("no DOCX produced ({detail})"),
            });
        }

        tokio::fs::rename(&produced, output)
            .await
            .map_err(|e| ConvertError::OutputWriteFailed {
                path: output.to_path_buf(),
                source: e,
            })?;
        Ok(())
    }
}
