// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progression Engine API Server
//!
//! Grants workout achievements, tracks points and levels, and serves the
//! leaderboard.

use progression_engine::{
    config::{Config, StorageBackend},
    db::{FirestoreDb, MemoryDb, SharedStore},
    services::{LogNotifier, NotificationDispatcher},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        storage = ?config.storage,
        "Starting Progression Engine API"
    );

    let store: SharedStore = match config.storage {
        StorageBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; all state is lost on restart");
            Arc::new(MemoryDb::new())
        }
    };

    let (notifications, _worker) = NotificationDispatcher::spawn(
        Arc::new(LogNotifier),
        config.notification_queue_capacity,
    );

    let state = Arc::new(AppState::new(config.clone(), store, Some(notifications)));

    // Seed the catalog before serving; award passes repair it again if needed.
    let existing = state.catalog.list_definitions().await?;
    let seeded = state.catalog.ensure_baseline(&existing).await?;
    tracing::info!(
        existing = existing.len(),
        seeded = seeded.len(),
        "Achievement catalog ready"
    );

    // Build router
    let app = progression_engine::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("progression_engine=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
