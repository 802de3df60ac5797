//! Axum router for the inference endpoint.
//!
//! | Route | Handler |
//! |---|---|
//! | `POST /api/gemini` | [`ask`]: question or image upload to the model |
//! | `GET /uploads/<name>` | stored uploads, via `ServeDir` (only when persisting) |
//! | `GET /health` | liveness probe |

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::inference::{GenerativeModel, InferenceDispatcher, InferenceRequest, InferenceResult};
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<InferenceDispatcher>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire `model` into a dispatcher configured from `config`. Creates the
    /// upload directory when persistence is on.
    pub fn new(model: Arc<dyn GenerativeModel>, config: ServerConfig) -> std::io::Result<Self> {
        let dispatcher = InferenceDispatcher::from_config(model, &config)?;
        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            config: Arc::new(config),
        })
    }
}

/// Build the complete router.
pub fn router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let mut app = Router::new()
        .route("/api/gemini", post(ask))
        .route("/health", get(health));

    if let Some(store) = state.dispatcher.uploads() {
        app = app.nest_service("/uploads", ServeDir::new(store.dir()));
    }

    // axum's own 2 MB default would otherwise cap multipart bodies.
    let mut app = app
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http());

    if config.allow_cross_origin {
        app = app.layer(CorsLayer::permissive());
    }

    app.with_state(state)
}

/// `POST /api/gemini`
pub async fn ask(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<InferenceResult>, ApiError> {
    let request = InferenceRequest::from_http(req, &state.config).await?;
    debug!(
        "Dispatching {} request",
        match &request {
            InferenceRequest::Text { .. } => "text",
            InferenceRequest::Image { .. } => "image",
        }
    );
    let result = state.dispatcher.handle(request).await?;
    Ok(Json(result))
}

/// `GET /health`
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
