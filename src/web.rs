use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use crate::api::{self, AppState, SharedState};
use crate::config::WaterSeekerConfig;
use crate::generation::WatsonxClient;
use crate::location_resolver::LocationResolver;

/// Full application: `/api` routes behind CORS and a body-size limit
pub fn app(state: SharedState, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(state))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(cors)
}

/// Authenticate once, then serve until the process is stopped
pub async fn run(config: &WaterSeekerConfig, port: u16) -> Result<()> {
    let client = WatsonxClient::new(&config.generation)?;
    let token = client
        .request_token()
        .await
        .context("Failed to acquire IAM token at start-up")?;
    let resolver = LocationResolver::new(config)?;

    let state = Arc::new(AppState {
        client,
        token,
        resolver,
    });

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://localhost:{}", port);
    axum::serve(listener, app(state, config.server.max_body_bytes))
        .await
        .context("Web server terminated")?;
    Ok(())
}
