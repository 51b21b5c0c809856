//! sift server entry point.
//!
//! Boots the HTTP service. Logs are JSON on stderr.

use std::sync::Arc;

use anyhow::{Context, Result};
use sift_client::{BingClient, BingConfig, OpenAiClient, OpenAiConfig};
use sift_core::{AppConfig, CacheDb};
use sift_server::{AnswerPipeline, AppState, router};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;

    tracing::info!(db_path = %config.db_path.display(), "opening cache");
    let db = CacheDb::open(&config.db_path).await.context("failed to open cache database")?;

    let search = BingClient::new(BingConfig::from_app_config(&config)?)?;
    let summarizer = OpenAiClient::new(OpenAiConfig::from_app_config(&config)?)?;

    let pipeline = AnswerPipeline::new(Arc::new(db.clone()), Arc::new(search), Arc::new(summarizer))
        .with_ttl(config.cache_ttl());

    spawn_purge(db, &config);
    warn_open_routes(&config);

    let app = router(AppState::new(pipeline), &config);
    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    tracing::info!(addr = %config.listen_addr, "starting sift server");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Periodically delete expired cache rows.
fn spawn_purge(db: CacheDb, config: &AppConfig) {
    let mut interval = tokio::time::interval(config.purge_interval());
    tokio::spawn(async move {
        loop {
            interval.tick().await;
            match db.purge_expired().await {
                Ok(0) => {}
                Ok(deleted) => tracing::info!(deleted, "purged expired cache entries"),
                Err(e) => tracing::warn!(code = e.code(), error = %e, "cache purge failed"),
            }
        }
    });
}

fn warn_open_routes(config: &AppConfig) {
    let routes = [
        ("/search", &config.search_api_key),
        ("/sources", &config.sources_api_key),
        ("/related", &config.related_api_key),
    ];
    for (route, key) in routes {
        if key.as_deref().is_none_or(str::is_empty) {
            tracing::warn!(route, "no API key configured, route is served without authentication");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
