/*
 * Responsibility
 * - Load config -> build JwtMiddleware -> assemble Router
 * - Apply middleware (JWT gate, HTTP layer)
 * - Start with axum::serve()
 */
use std::sync::Arc;

use anyhow::Result;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use jwt_gate::{
    AuthConfig, Claims,
    config::listen_addr,
    middleware::{self, http::HttpLimits},
    services::auth::build_middleware,
};

pub async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,jwt_gate=debug")),
        )
        .init();

    let mut config = AuthConfig::from_env()?;
    // The health check is never gated.
    if !config.exclusion_urls.iter().any(|u| u == "/health") {
        config.exclusion_urls.push("/health".to_string());
    }
    let gate = Arc::new(build_middleware(&config)?);

    let app = middleware::http::apply(build_router(gate), HttpLimits::default());

    let addr = listen_addr()?;
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(gate: Arc<jwt_gate::JwtMiddleware<jwt_gate::Validator>>) -> Router {
    let routes = Router::new()
        .route("/health", get(health))
        .route("/api/v1/me", get(me));

    middleware::auth::apply(routes, gate)
}

async fn health() -> &'static str {
    "ok"
}

async fn me(claims: Option<Claims>) -> Json<Value> {
    match claims {
        Some(Claims(claims)) => Json(json!(claims)),
        None => Json(json!({ "anonymous": true })),
    }
}
