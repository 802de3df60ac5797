//! Configuration for both dispatchers.
//!
//! [`ConversionConfig`] controls the `convert` binary, [`ServerConfig`] the
//! inference endpoint. Both are built through a builder whose `build()`
//! validates the combination, so a binary only has to map its flags onto
//! setters.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default upper bound on a request body: 20 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Default model identifier sent to the provider.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default provider name handed to `edgequake_llm::ProviderFactory`.
pub const DEFAULT_PROVIDER: &str = "gemini";

// ── Conversion ───────────────────────────────────────────────────────────

/// Which external converter performs the PDF → DOCX step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// The Python `pdf2docx` package, run through a Python interpreter. (default)
    #[default]
    Pdf2Docx,
    /// LibreOffice in headless mode with the Writer PDF import filter.
    LibreOffice,
}

impl EngineKind {
    /// Name used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Pdf2Docx => "pdf2docx",
            EngineKind::LibreOffice => "libreoffice",
        }
    }
}

/// Configuration for a PDF → DOCX conversion.
///
/// # Example
/// ```rust
/// use docbridge::{ConversionConfig, EngineKind};
///
/// let config = ConversionConfig::builder()
///     .engine(EngineKind::LibreOffice)
///     .soffice_exe("/opt/libreoffice/program/soffice")
///     .build()
///     .unwrap();
/// assert_eq!(config.engine, EngineKind::LibreOffice);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// External converter to run. Default: [`EngineKind::Pdf2Docx`].
    pub engine: EngineKind,

    /// Python interpreter that has `pdf2docx` installed. Default: `python3`.
    pub python_exe: PathBuf,

    /// LibreOffice executable. Default: `soffice`.
    pub soffice_exe: PathBuf,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            python_exe: PathBuf::from("python3"),
            soffice_exe: PathBuf::from("soffice"),
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn engine(mut self, engine: EngineKind) -> Self {
        self.config.engine = engine;
        self
    }

    pub fn python_exe(mut self, exe: impl Into<PathBuf>) -> Self {
        self.config.python_exe = exe.into();
        self
    }

    pub fn soffice_exe(mut self, exe: impl Into<PathBuf>) -> Self {
        self.config.soffice_exe = exe.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConfigError> {
        let c = &self.config;
        let exe = match c.engine {
            EngineKind::Pdf2Docx => &c.python_exe,
            EngineKind::LibreOffice => &c.soffice_exe,
        };
        if exe.as_os_str().is_empty() {
            return Err(ConfigError(format!(
                "No executable configured for engine '{}'",
                c.engine.as_str()
            )));
        }
        Ok(self.config)
    }
}

// ── Inference server ─────────────────────────────────────────────────────

/// Configuration for the inference endpoint.
///
/// The three switches cover the deployments the endpoint has been run in:
/// a bare text/image proxy, the same proxy behind a browser front-end
/// (`allow_cross_origin`), and the full variant that also checks extensions
/// and keeps uploads on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to. Default: `127.0.0.1:5000`.
    pub bind_address: SocketAddr,

    /// Reject uploads whose filename extension is not an allowed image type.
    pub validate_extension: bool,

    /// Keep uploaded images under [`ServerConfig::upload_dir`] and return an `image_url`.
    pub persist_upload: bool,

    /// Emit permissive CORS headers.
    pub allow_cross_origin: bool,

    /// Provider name, e.g. `gemini`, `openai`. Default: `gemini`.
    pub provider: String,

    /// Model identifier. Default: `gemini-1.5-flash`.
    pub model_name: String,

    /// Directory holding stored uploads. Default: `uploads`.
    pub upload_dir: PathBuf,

    /// Maximum accepted request body. Default: 20 MiB.
    pub max_body_bytes: usize,

    /// Sampling temperature forwarded to the model; provider default when `None`.
    pub temperature: Option<f32>,

    /// Output token cap forwarded to the model; provider default when `None`.
    pub max_tokens: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 5000)),
            validate_extension: true,
            persist_upload: true,
            allow_cross_origin: true,
            provider: DEFAULT_PROVIDER.to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            temperature: None,
            max_tokens: None,
        }
    }
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    pub fn validate_extension(mut self, v: bool) -> Self {
        self.config.validate_extension = v;
        self
    }

    pub fn persist_upload(mut self, v: bool) -> Self {
        self.config.persist_upload = v;
        self
    }

    pub fn allow_cross_origin(mut self, v: bool) -> Self {
        self.config.allow_cross_origin = v;
        self
    }

    pub fn provider(mut self, name: impl Into<String>) -> Self {
        self.config.provider = name.into();
        self
    }

    pub fn model_name(mut self, model: impl Into<String>) -> Self {
        self.config.model_name = model.into();
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn max_body_bytes(mut self, n: usize) -> Self {
        self.config.max_body_bytes = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let c = &self.config;
        if c.max_body_bytes == 0 {
            return Err(ConfigError("max_body_bytes must be ≥ 1".into()));
        }
        if c.model_name.trim().is_empty() {
            return Err(ConfigError("model name is empty".into()));
        }
        if c.provider.trim().is_empty() {
            return Err(ConfigError("provider name is empty".into()));
        }
        if c.persist_upload && c.upload_dir.as_os_str().is_empty() {
            return Err(ConfigError("persist_upload requires an upload directory".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.engine, EngineKind::Pdf2Docx);
        assert_eq!(c.python_exe, PathBuf::from("python3"));
        assert_eq!(c.soffice_exe, PathBuf::from("soffice"));
    }

    #[test]
    fn conversion_builder_rejects_empty_exe() {
        let err = ConversionConfig::builder()
            .engine(EngineKind::LibreOffice)
            .soffice_exe("")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("libreoffice"));
    }

    #[test]
    fn server_defaults_match_full_variant() {
        let c = ServerConfig::default();
        assert!(c.validate_extension);
        assert!(c.persist_upload);
        assert!(c.allow_cross_origin);
        assert_eq!(c.model_name, "gemini-1.5-flash");
        assert_eq!(c.max_body_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn server_builder_clamps_temperature() {
        let c = ServerConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, Some(2.0));
    }

    #[test]
    fn server_builder_rejects_empty_model() {
        assert!(ServerConfig::builder().model_name("  ").build().is_err());
        assert!(ServerConfig::builder().max_body_bytes(0).build().is_err());
    }
}
