//! inference-server: HTTP front end for text questions and image uploads.
//!
//! Startup order:
//! 1. Parse flags / environment into a `ServerConfig`.
//! 2. Initialise tracing (JSON with `--log-json`).
//! 3. Build the model client once; credentials come from the environment.
//! 4. Open the upload directory and build the router.
//! 5. Serve until Ctrl-C / SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use docbridge::{router, AppState, LlmModel, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default address (127.0.0.1:5000)
  GEMINI_API_KEY=... inference-server

  # Listen on all interfaces with a different model
  inference-server --bind 0.0.0.0:8080 --model gemini-2.0-flash

  # Answer image questions without keeping the uploads
  inference-server --persist-upload false

ENDPOINTS:
  POST /api/gemini        {"question": "..."} or multipart image (+ prompt)
  GET  /uploads/<name>    stored uploads
  GET  /health            liveness probe

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (provider "gemini")
  RUST_LOG                tracing filter, overrides -v
"#;

/// Serve a generative-model endpoint for text questions and image uploads.
#[derive(Parser, Debug)]
#[command(
    name = "inference-server",
    version,
    about = "Serve POST /api/gemini for text questions and image uploads",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "DOCBRIDGE_BIND", default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// LLM provider name (gemini, openai, anthropic, ollama, ...).
    #[arg(long, env = "DOCBRIDGE_PROVIDER", default_value = docbridge::config::DEFAULT_PROVIDER)]
    provider: String,

    /// Model identifier.
    #[arg(long, env = "DOCBRIDGE_MODEL", default_value = docbridge::config::DEFAULT_MODEL)]
    model: String,

    /// Directory where image uploads are stored and served from.
    #[arg(long, env = "DOCBRIDGE_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Maximum request body size in bytes.
    #[arg(
        long,
        env = "DOCBRIDGE_MAX_BODY_BYTES",
        default_value_t = docbridge::config::DEFAULT_MAX_BODY_BYTES
    )]
    max_body_bytes: usize,

    /// Reject uploads whose extension is not png/jpg/jpeg/gif.
    #[arg(
        long,
        env = "DOCBRIDGE_VALIDATE_EXTENSION",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    validate_extension: bool,

    /// Keep uploads on disk and return their URL.
    #[arg(
        long,
        env = "DOCBRIDGE_PERSIST_UPLOAD",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    persist_upload: bool,

    /// Send permissive CORS headers.
    #[arg(
        long = "cors",
        env = "DOCBRIDGE_CORS",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    allow_cross_origin: bool,

    /// Sampling temperature passed to the model (0.0–2.0).
    #[arg(long, env = "DOCBRIDGE_TEMPERATURE")]
    temperature: Option<f32>,

    /// Maximum output tokens per answer.
    #[arg(long, env = "DOCBRIDGE_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Emit logs as JSON lines.
    #[arg(long, env = "DOCBRIDGE_LOG_JSON")]
    log_json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCBRIDGE_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── 1. Tracing ─────────────────────────────────────────────────────────
    let default_filter = if cli.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(true);

    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "inference-server starting");

    // ── 2. Configuration ───────────────────────────────────────────────────
    let config = build_config(&cli)?;

    // ── 3. Model client ────────────────────────────────────────────────────
    let model = LlmModel::from_config(&config).context("Failed to initialise the model client")?;
    info!(provider = %config.provider, model = %config.model_name, "model client ready");

    // ── 4. Router ──────────────────────────────────────────────────────────
    let addr = config.bind_address;
    let state = AppState::new(Arc::new(model), config).with_context(|| {
        format!(
            "Failed to create upload directory {}",
            cli.upload_dir.display()
        )
    })?;
    let app = router(state);

    // ── 5. HTTP server with graceful shutdown ──────────────────────────────
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("inference-server stopped");
    Ok(())
}

/// Map CLI args to `ServerConfig`.
fn build_config(cli: &Cli) -> Result<ServerConfig> {
    let mut builder = ServerConfig::builder()
        .bind_address(cli.bind)
        .provider(&cli.provider)
        .model_name(&cli.model)
        .upload_dir(&cli.upload_dir)
        .max_body_bytes(cli.max_body_bytes)
        .validate_extension(cli.validate_extension)
        .persist_upload(cli.persist_upload)
        .allow_cross_origin(cli.allow_cross_origin);

    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }

    Ok(builder.build()?)
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
