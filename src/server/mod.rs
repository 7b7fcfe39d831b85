//! HTTP API for lead management.
//!
//! Thin axum layer over the lead store, the workflow engine, and the OCR
//! extraction pipeline. Extraction runs on a blocking worker so concurrent
//! uploads never stall unrelated request handling.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::Settings;
use crate::ocr::LeadExtractor;
use crate::storage::LeadStore;

/// Shared state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LeadStore>,
    pub extractor: Arc<LeadExtractor>,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            store: Arc::new(LeadStore::open(settings.data_dir()).await?),
            extractor: Arc::new(LeadExtractor::new(settings.ocr.clone())),
        })
    }
}

/// Run the HTTP server until shutdown.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let state = AppState::new(settings).await?;
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router).await.context("server error")
}
