//! External PDF → DOCX converters.
//!
//! The layout analysis and DOCX generation happen entirely inside an external
//! program; this module only knows how to start it, hand it the page range and
//! interpret its exit status.
//!
//! ```text
//! convert ──▶ ConversionEngine::convert(input, output, PageRange::full())
//!               ├─ Pdf2DocxEngine     python -c <runner> (pdf2docx package)
//!               └─ LibreOfficeEngine  soffice --headless --convert-to docx
//! ```

pub mod libreoffice;
pub mod pdf2docx;
mod process;

use crate::config::{ConversionConfig, EngineKind};
use crate::error::ConvertError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use libreoffice::LibreOfficeEngine;
pub use pdf2docx::Pdf2DocxEngine;

/// Zero-based page range handed to a converter.
///
/// `end = None` means "through the last page".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: Option<u32>,
}

impl PageRange {
    /// The whole document.
    pub fn full() -> Self {
        Self::default()
    }

    pub fn is_full(&self) -> bool {
        self.start == 0 && self.end.is_none()
    }
}

/// A converter that turns the PDF at `input` into a DOCX at `output`.
///
/// Implementations make exactly one attempt and overwrite `output`.
#[async_trait]
pub trait ConversionEngine: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    async fn convert(&self, input: &Path, output: &Path, pages: PageRange)
        -> Result<(), ConvertError>;
}

/// Build the engine selected by `config.engine`.
pub fn engine_for(config: &ConversionConfig) -> Box<dyn ConversionEngine> {
    match config.engine {
        EngineKind::Pdf2Docx => Box::new(Pdf2DocxEngine::new(&config.python_exe)),
        EngineKind::LibreOffice => Box::new(LibreOfficeEngine::new(&config.soffice_exe)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_range_is_default() {
        assert!(PageRange::full().is_full());
        assert!(!PageRange { start: 2, end: None }.is_full());
        assert!(!PageRange { start: 0, end: Some(3) }.is_full());
    }

    #[test]
    fn engine_for_follows_config() {
        let cfg = ConversionConfig::default();
        assert_eq!(engine_for(&cfg).name(), "pdf2docx");

        let cfg = ConversionConfig::builder()
            .engine(EngineKind::LibreOffice)
            .build()
            .unwrap();
        assert_eq!(engine_for(&cfg).name(), "libreoffice");
    }
}
