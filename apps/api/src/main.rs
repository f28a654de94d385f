mod assets;
mod completion;
mod config;
mod errors;
mod forms;
mod render;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assets::AssetStore;
use crate::completion::CompletionClient;
use crate::config::Config;
use crate::forms::FormStore;
use crate::routes::{build_router, cors_layer};
use crate::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok(); // load .env if present; ignore if missing

    // Logging comes up before config so a missing secret is reported through it.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let outcome = launch(Config::from_env()).await;
    ExitCode::from(exit_status(&outcome))
}

/// Crate logs plus the per-request spans from `TraceLayer`.
fn default_filter() -> String {
    format!("{}=info,tower_http=info", env!("CARGO_CRATE_NAME"))
}

fn exit_status(outcome: &Result<()>) -> u8 {
    match outcome {
        Ok(()) => 0,
        Err(e) => {
            error!("{e:#}");
            1
        }
    }
}

/// A config error ends startup here, before any listener is bound.
async fn launch(config: Result<Config>) -> Result<()> {
    let config = config.context("Startup aborted")?;
    run(config).await
}

async fn run(config: Config) -> Result<()> {
    info!("Starting Persona API v{}", env!("CARGO_PKG_VERSION"));

    let completer = CompletionClient::new(
        config.openai_api_key.clone(),
        config.completion_api_url.clone(),
        config.completion_timeout,
    )
    .context("Failed to build completion HTTP client")?;
    info!(
        "Completion client initialized (model: {}, endpoint: {})",
        completion::MODEL,
        config.completion_api_url
    );

    let assets = AssetStore::new(config.assets_dir.clone());
    info!("Serving static documents from {}", assets.root().display());

    match &config.cors_allowed_origin {
        Some(origin) => info!("CORS restricted to origin {:?}", origin),
        None => info!("CORS open to any origin"),
    }

    let state = AppState {
        completer: Arc::new(completer),
        forms: Arc::new(FormStore::new()),
        assets,
    };

    let app = build_router(state, cors_layer(config.cors_allowed_origin.clone()))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_secret_fails_before_binding() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let lookup = move |key: &str| (key == "PORT").then(|| port.to_string());

        let outcome = launch(Config::from_lookup(lookup)).await;
        let message = format!("{:#}", outcome.as_ref().unwrap_err());
        assert!(message.contains("OPENAI_API_KEY"));
        assert_eq!(exit_status(&outcome), 1);

        // Nothing was bound to the configured port.
        std::net::TcpListener::bind(("0.0.0.0", port)).unwrap();
    }

    #[test]
    fn test_exit_status_success() {
        assert_eq!(exit_status(&Ok(())), 0);
    }

    #[test]
    fn test_default_filter_includes_request_spans() {
        let filter = default_filter();
        assert!(filter.contains("tower_http=info"));
        assert!(EnvFilter::try_new(filter).is_ok());
    }
}
