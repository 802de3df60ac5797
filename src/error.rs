//! Error types for docbridge.
//!
//! Three error types, one per boundary:
//!
//! * [`ConvertError`]: the conversion dispatcher. Every variant is fatal to
//!   the single conversion a `convert` process performs.
//!
//! * [`ApiError`]: the inference endpoint. Implements
//!   [`axum::response::IntoResponse`]; validation variants carry a specific
//!   client message, failure variants log the detail and answer generically.
//!
//! * [`ExternalServiceError`]: everything that goes wrong inside the
//!   generative-AI client or the image codec. It is wrapped by
//!   [`ApiError::InferenceFailure`] so the inner text never reaches a client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;
use tracing::error;

/// All errors returned by [`crate::convert::convert`].
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file does not exist -> {path}")]
    MissingInput { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is blank or names a directory.
    #[error("Invalid input '{input}': not a PDF file path")]
    InvalidInput { input: String },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The external converter could not be started at all.
    #[error("Conversion engine '{engine}' is not available: {detail}")]
    EngineUnavailable { engine: &'static str, detail: String },

    /// The external converter ran and reported a failure.
    #[error("{engine}: {detail}")]
    ConversionFailed { engine: &'static str, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or inspect the output DOCX file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// True when the failure happened before any engine was started.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ConvertError::MissingInput { .. }
                | ConvertError::PermissionDenied { .. }
                | ConvertError::InvalidInput { .. }
                | ConvertError::NotAPdf { .. }
        )
    }
}

/// A configuration builder rejected its settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid configuration: {0}")]
pub struct ConfigError(pub String);

/// Failure inside an external collaborator of the inference endpoint.
#[derive(Debug, Error)]
pub enum ExternalServiceError {
    /// The provider could not be constructed (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    NotConfigured { provider: String, hint: String },

    /// The generative-AI client returned an error.
    #[error("model '{model}' call failed: {detail}")]
    Model { model: String, detail: String },

    /// The generative-AI client answered without any text.
    #[error("model '{model}' returned an empty response")]
    EmptyResponse { model: String },

    /// Re-encoding a decoded image for the model failed.
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// A blocking worker panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Worker(String),
}

/// All errors that can leave the `POST /api/gemini` handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// JSON request without a non-empty `question`.
    #[error("Question is required")]
    MissingQuestion,

    /// Multipart request without an `image` file part.
    #[error("Image is required")]
    MissingImage,

    /// Uploaded filename does not carry an allowed image extension.
    #[error("Unsupported file type")]
    UnsupportedFileType,

    /// Uploaded bytes could not be decoded as an image.
    #[error("Invalid image file")]
    InvalidImage,

    /// Request was neither JSON nor multipart form data.
    #[error("Unsupported content type")]
    UnsupportedContentType,

    /// Request body exceeded the configured size limit.
    #[error("Request body exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    /// Body matched its content type but could not be parsed.
    #[error("Malformed request body: {0}")]
    MalformedRequest(String),

    /// The model (or image encoding for it) failed.
    #[error("inference failed: {0}")]
    InferenceFailure(#[from] ExternalServiceError),

    /// Writing the upload to disk failed.
    #[error("failed to store upload '{path}': {source}")]
    StorageFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingQuestion
            | ApiError::MissingImage
            | ApiError::UnsupportedFileType
            | ApiError::InvalidImage
            | ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InferenceFailure(_) | ApiError::StorageFailure { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let client_message = match &self {
            ApiError::InferenceFailure(e) => {
                error!(error = %e, "generative model error");
                "Failed to generate response".to_owned()
            }
            ApiError::StorageFailure { .. } => {
                error!(error = %self, "upload storage error");
                "Failed to store uploaded image".to_owned()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}
