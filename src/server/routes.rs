//! Router configuration for the HTTP API.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Leads
        .route("/leads", get(handlers::list_leads))
        .route("/leads/manual", post(handlers::create_lead_manual))
        .route("/leads/document", post(handlers::create_lead_from_document))
        .route("/leads/:id", delete(handlers::delete_lead))
        .route("/leads/:id/status", put(handlers::update_lead_status))
        // Workflows
        .route("/workflow", post(handlers::save_workflow))
        .route("/workflows", get(handlers::list_workflows))
        .route("/workflows/:id", delete(handlers::delete_workflow))
        // Health
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
