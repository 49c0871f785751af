// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Study Planner API Server
//!
//! Generates study timetables through the AI planning agent and keeps them
//! in the document store.

use anyhow::Context;
use std::sync::Arc;
use study_planner::{
    config::{Config, StoreBackend},
    db::{DocumentStore, FirestoreDb, MemoryDb},
    services::{AgentClient, FirebaseTokenVerifier, MetadataKeys, TimetableWorkflow},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting Study Planner API");

    // Initialize document store
    let db: Arc<dyn DocumentStore> = match config.document_store {
        StoreBackend::Firestore => Arc::new(
            FirestoreDb::new(&config.firebase_project_id)
                .await
                .context("Failed to connect to Firestore")?,
        ),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; data is lost on restart");
            Arc::new(MemoryDb::new())
        }
    };

    let identity = FirebaseTokenVerifier::from_config(&config)?;

    let agent = AgentClient::new(&config.ai_agent_base_url, config.agent_timeout)?;
    tracing::info!(
        base_url = agent.base_url(),
        timeout_secs = config.agent_timeout.as_secs(),
        "AI agent client initialized"
    );

    let metadata_keys = config
        .agent_metadata_keys
        .as_ref()
        .map(MetadataKeys::new)
        .unwrap_or_default();
    let workflow = TimetableWorkflow::new(db.clone(), agent, metadata_keys);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        identity,
        workflow,
    });

    // Build router
    let app = study_planner::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("study_planner=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
