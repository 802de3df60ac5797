//! The generative-model seam.
//!
//! The dispatcher only sees [`GenerativeModel`]. Production code plugs in
//! [`LlmModel`], a thin wrapper over an `edgequake_llm` provider built once at
//! startup; tests plug in a double that records calls.

use crate::config::ServerConfig;
use crate::error::ExternalServiceError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use image::DynamicImage;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// What the model is asked.
#[derive(Debug, Clone)]
pub enum ModelInput {
    /// A plain question.
    Text(String),
    /// An image and the instruction to apply to it.
    Image { image: DynamicImage, prompt: String },
}

/// A long-lived handle to a text-producing model.
///
/// One call per request; implementations must not retry.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Identifier of the model behind this handle.
    fn model_name(&self) -> &str;

    /// Ask the model and return its text answer.
    async fn generate(&self, input: ModelInput) -> Result<String, ExternalServiceError>;
}

/// [`GenerativeModel`] backed by an `edgequake_llm` provider.
pub struct LlmModel {
    provider: Arc<dyn LLMProvider>,
    model: String,
    options: CompletionOptions,
}

impl LlmModel {
    /// Wrap an already-built provider.
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            options: CompletionOptions::default(),
        }
    }

    /// Build the provider named in `config`. The API key is read from the
    /// provider's usual environment variable (`GEMINI_API_KEY` for Gemini).
    pub fn from_config(config: &ServerConfig) -> Result<Self, ExternalServiceError> {
        let provider = ProviderFactory::create_llm_provider(&config.provider, &config.model_name)
            .map_err(|e| ExternalServiceError::NotConfigured {
                provider: config.provider.clone(),
                hint: format!("{e}"),
            })?;
        Ok(Self::new(provider, config.model_name.clone()).with_options(build_options(config)))
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl GenerativeModel for LlmModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, input: ModelInput) -> Result<String, ExternalServiceError> {
        let start = Instant::now();
        let message = match input {
            ModelInput::Text(question) => ChatMessage::user(question.as_str()),
            ModelInput::Image { image, prompt } => {
                let data = tokio::task::spawn_blocking(move || encode_image(&image))
                    .await
                    .map_err(|e| ExternalServiceError::Worker(e.to_string()))??;
                ChatMessage::user_with_images(prompt.as_str(), vec![data])
            }
        };

        let response = self
            .provider
            .chat(&[message], Some(&self.options))
            .await
            .map_err(|e| ExternalServiceError::Model {
                model: self.model.clone(),
                detail: format!("{e}"),
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.model,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            return Err(ExternalServiceError::EmptyResponse {
                model: self.model.clone(),
            });
        }
        Ok(response.content)
    }
}

/// Build `CompletionOptions` from the server config.
fn build_options(config: &ServerConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}

/// Encode a decoded upload as a base64 PNG for the multimodal request.
///
/// Every accepted format (PNG, JPEG, GIF) is normalised to PNG so the
/// provider sees a single MIME type; GIFs contribute their first frame.
pub fn encode_image(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png"))
}
