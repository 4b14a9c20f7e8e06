// src/main.rs

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod aggregate;
mod api_tests;
mod config;
mod ingest;
mod parser;
mod schedule;
mod server;
mod store;
mod work_order;

use config::Config;
use server::{build_router, AppState};
use store::{MergeMode, WorkOrderStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Reading configuration from environment failed")?;
    info!("Configuration loaded: {:?}", config);

    let store = WorkOrderStore::new();
    if let Some(path) = &config.seed_data_path {
        seed_collection(&store, path);
    }

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let state = AppState {
        store,
        config: Arc::new(config),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Binding {} failed", addr))?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app)
        .await
        .context("HTTP server failed")?;
    Ok(())
}

/// Load a paste-format text file into the fresh collection. Seeding is best
/// effort: a missing or useless file logs a warning and the server starts
/// empty.
fn seed_collection(store: &WorkOrderStore, path: &str) {
    match std::fs::read_to_string(path) {
        Ok(payload) => {
            let outcome = ingest::ingest_text(&payload, store.ids());
            if outcome.accepted.is_empty() {
                warn!("Seed file {} produced no work orders", path);
            } else {
                info!(
                    "Seeded {} work orders from {} ({} rows skipped)",
                    outcome.accepted_count(),
                    path,
                    outcome.skipped
                );
                store.merge_batch(outcome.accepted, MergeMode::Replace);
            }
        }
        Err(e) => warn!("Could not read seed file {}: {}", path, e),
    }
}
