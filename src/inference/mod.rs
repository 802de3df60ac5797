//! Inference dispatcher behind `POST /api/gemini`.
//!
//! ```text
//! Text  ──────────────────────────────────────────────▶ model ──▶ {answer}
//! Image ──▶ extension? ──▶ decode ──▶ persist? ──▶ model ──▶ {answer, image_url?}
//! ```
//!
//! Every validation step runs before the model is called, so a rejected
//! request never costs a model call.

pub mod model;
pub mod request;
pub mod upload;

pub use model::{encode_image, GenerativeModel, LlmModel, ModelInput};
pub use upload::{has_allowed_extension, sanitize_filename, StoredUpload, UploadStore};

use crate::config::ServerConfig;
use crate::error::{ApiError, ExternalServiceError};
use axum::body::Bytes;
use image::DynamicImage;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A decoded `POST /api/gemini` request.
#[derive(Debug, Clone)]
pub enum InferenceRequest {
    /// JSON `{"question": ...}`.
    Text { question: String },
    /// Multipart upload of an `image` file with an optional `prompt`.
    Image {
        image_bytes: Bytes,
        /// Client-supplied filename, unsanitized.
        filename: String,
        prompt: String,
    },
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferenceResult {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Validates a request, stores uploads and calls the model.
pub struct InferenceDispatcher {
    model: Arc<dyn GenerativeModel>,
    uploads: Option<UploadStore>,
    validate_extension: bool,
}

impl InferenceDispatcher {
    /// `uploads = None` disables persistence; no `image_url` is returned then.
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        uploads: Option<UploadStore>,
        validate_extension: bool,
    ) -> Self {
        Self {
            model,
            uploads,
            validate_extension,
        }
    }

    /// Build a dispatcher from `config`, opening the upload directory when
    /// persistence is on.
    pub fn from_config(
        model: Arc<dyn GenerativeModel>,
        config: &ServerConfig,
    ) -> std::io::Result<Self> {
        let uploads = if config.persist_upload {
            Some(UploadStore::open(&config.upload_dir)?)
        } else {
            None
        };
        Ok(Self::new(model, uploads, config.validate_extension))
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub fn uploads(&self) -> Option<&UploadStore> {
        self.uploads.as_ref()
    }

    /// Run one request to completion. Exactly one model call on success,
    /// none on a validation failure.
    pub async fn handle(&self, request: InferenceRequest) -> Result<InferenceResult, ApiError> {
        let start = Instant::now();
        let result = match request {
            InferenceRequest::Text { question } => {
                debug!("Text question ({} chars)", question.len());
                let answer = self.model.generate(ModelInput::Text(question)).await?;
                InferenceResult {
                    answer,
                    image_url: None,
                }
            }
            InferenceRequest::Image {
                image_bytes,
                filename,
                prompt,
            } => self.handle_image(image_bytes, &filename, prompt).await?,
        };
        info!(
            "{} answered in {}ms",
            self.model.model_name(),
            start.elapsed().as_millis()
        );
        Ok(result)
    }

    async fn handle_image(
        &self,
        image_bytes: Bytes,
        filename: &str,
        prompt: String,
    ) -> Result<InferenceResult, ApiError> {
        if self.validate_extension && !has_allowed_extension(filename) {
            warn!("Rejected upload {:?}: unsupported extension", filename);
            return Err(ApiError::UnsupportedFileType);
        }

        let image = decode_image(image_bytes.clone()).await?;
        debug!(
            "Decoded {:?}: {}x{}",
            filename,
            image.width(),
            image.height()
        );

        let image_url = match &self.uploads {
            Some(store) => Some(store.store(filename, image_bytes).await?.url()),
            None => None,
        };

        let answer = self
            .model
            .generate(ModelInput::Image { image, prompt })
            .await?;
        Ok(InferenceResult { answer, image_url })
    }
}

/// Decode uploaded bytes on a blocking thread.
async fn decode_image(bytes: Bytes) -> Result<DynamicImage, ApiError> {
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| ExternalServiceError::Worker(e.to_string()))?
        .map_err(|e| {
            debug!("Image decode failed: {}", e);
            ApiError::InvalidImage
        })
}
