//! DocuSign Connect webhook receiver
//!
//! Accepts envelope status notifications, verifies their HMAC signatures,
//! runs them through the webhook pipeline, and archives signed documents
//! as envelopes complete. A small operator surface exposes the most recent
//! deliveries for debugging Connect configurations.
//!
//! Configuration comes from the environment (or a `.env` file):
//! `DOCUSIGN_CLIENT_ID`, `DOCUSIGN_USER_ID`, `DOCUSIGN_PRIVATE_KEY_PATH`,
//! `DOCUSIGN_AUTH_HOST`, `DOCUSIGN_HMAC_KEY`, `WEBHOOK_OUTPUT_DIR`, `PORT`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod error;
mod handlers;
mod state;

use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    // The operator endpoints get hit from dashboards on other origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::health))
        .route("/webhook/docusign", post(handlers::receive_webhook))
        .route("/webhooks", get(handlers::list_webhooks))
        .route("/webhooks/:seq", get(handlers::get_webhook))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("signbridge_webhook=info".parse()?)
                .add_directive("signbridge_core=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Initializing webhook receiver (v{})", signbridge_core::VERSION);
    let state = Arc::new(AppState::from_env()?);
    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting webhook receiver on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
