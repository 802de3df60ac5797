//! # docbridge
//!
//! Two small bridges to external engines:
//!
//! * **PDF → DOCX.** [`convert`] checks a local PDF and hands it to an
//!   external converter, the Python `pdf2docx` package by default or
//!   headless LibreOffice. Layout analysis is entirely the converter's job.
//! * **Question / image inference.** [`server::router`] exposes
//!   `POST /api/gemini`, which forwards a text question or an uploaded image
//!   (plus an instruction) to a generative model and returns its answer.
//!
//! ## Conversion
//!
//! ```text
//! input ──▶ resolve (path, %PDF check) ──▶ engine ──▶ output.docx
//! ```
//!
//! ```rust,no_run
//! use docbridge::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let report = convert("report.pdf", "report.docx", &config).await?;
//!     eprintln!("{} bytes via {}", report.output_bytes, report.engine);
//!     Ok(())
//! }
//! ```
//!
//! ## Inference endpoint
//!
//! ```rust,no_run
//! use docbridge::{router, AppState, LlmModel, ServerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // The API key is read from GEMINI_API_KEY.
//!     let config = ServerConfig::default();
//!     let model = Arc::new(LlmModel::from_config(&config)?);
//!     let bind = config.bind_address;
//!     let app = router(AppState::new(model, config)?);
//!     let listener = tokio::net::TcpListener::bind(bind).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `convert` and `inference-server` binaries (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docbridge = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod inference;
pub mod input;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, EngineKind, ServerConfig, ServerConfigBuilder,
};
pub use convert::{convert, convert_sync, convert_with, ConversionReport};
pub use engine::{ConversionEngine, PageRange};
pub use error::{ApiError, ConfigError, ConvertError, ExternalServiceError};
pub use inference::{
    GenerativeModel, InferenceDispatcher, InferenceRequest, InferenceResult, LlmModel, ModelInput,
};
pub use server::{router, AppState};
