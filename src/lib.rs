pub mod agent;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod model;
pub mod plan;
pub mod profile;
pub mod providers;
pub mod secrets;
pub mod session;
pub mod web;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use config::Config;
use model::HttpModelClientFactory;
use secrets::EnvSecretStore;
use web::AppState;

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cfg = Config::from_env();
    info!(
        model = %cfg.model,
        base_url = %cfg.model_base_url,
        max_tokens = cfg.model_max_tokens,
        timeout_secs = cfg.model_timeout_secs,
        bind_addr = %cfg.bind_addr,
        session_idle_secs = cfg.session_idle_secs,
        max_sessions = cfg.max_sessions,
        "loaded runtime configuration"
    );

    let bind: SocketAddr = cfg
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid BIND_ADDR '{}' (expected host:port)", cfg.bind_addr))?;

    let state = AppState::new(
        Arc::new(HttpModelClientFactory::new(cfg.clone())),
        Arc::new(EnvSecretStore),
    )
    .with_session_limits(cfg.session_idle_secs, cfg.max_sessions);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!(%bind, "serving health plan form");

    axum::serve(listener, web::router(state))
        .await
        .context("HTTP server terminated unexpectedly")
}
