//! Request handlers for the lead management API.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{Lead, LeadSource, LeadStatus, Workflow, WorkflowEdge, WorkflowNode};
use crate::ocr::{extract_email, LeadExtractor};
use crate::workflow::{trigger_lead_created, validate_workflow};

use super::AppState;

/// Extensions accepted by the document upload endpoint.
const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".png", ".jpg", ".jpeg"];

/// API error carrying an HTTP status and a message.
pub struct ApiError(StatusCode, String);

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, detail.into())
    }

    fn not_found(detail: impl Into<String>) -> Self {
        Self(StatusCode::NOT_FOUND, detail.into())
    }

    fn internal(detail: impl Into<String>) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, detail.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        error!("Internal error: {:#}", e);
        Self::internal(e.to_string())
    }
}

/// Payload for manual lead creation.
#[derive(Debug, Deserialize)]
pub struct CreateLead {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Payload for a lead status update.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// Payload for saving a workflow.
#[derive(Debug, Deserialize)]
pub struct WorkflowRequest {
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
    #[serde(default = "default_workflow_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

fn default_workflow_name() -> String {
    "Unnamed Workflow".to_string()
}

#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub message: String,
    pub workflow_id: String,
}

pub async fn list_leads(State(state): State<AppState>) -> Json<Vec<Lead>> {
    Json(state.store.leads().await)
}

pub async fn create_lead_manual(
    State(state): State<AppState>,
    Json(payload): Json<CreateLead>,
) -> Result<Json<Lead>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name cannot be empty"));
    }
    if extract_email(&payload.email).as_deref() != Some(payload.email.trim()) {
        return Err(ApiError::bad_request("Invalid email format"));
    }

    let lead = state
        .store
        .add_lead(
            payload.name.trim().to_string(),
            payload.email.trim().to_string(),
            payload.phone.trim().to_string(),
            LeadSource::Manual,
        )
        .await?;
    info!("Created lead {} ({})", lead.id, lead.name);

    trigger_lead_created(&state.store, &lead).await;
    Ok(Json(lead))
}

/// Extract lead information from an uploaded document.
///
/// The extraction pipeline itself never fails; a result carrying `error`
/// maps to HTTP 500 here, everything else (including the manual-entry
/// fallback) creates a lead and returns the extraction verbatim.
pub async fn create_lead_from_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let (filename, content) = read_upload(multipart).await?;

    let lower = filename.to_lowercase();
    if !ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return Err(ApiError::bad_request(format!(
            "Only {} files are supported",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    let extractor: std::sync::Arc<LeadExtractor> = state.extractor.clone();
    let extraction = tokio::task::spawn_blocking(move || extractor.extract(&content, &filename))
        .await
        .map_err(|e| ApiError::internal(format!("extraction task failed: {}", e)))?;

    if let Some(cause) = &extraction.error {
        return Err(ApiError::internal(format!("OCR failed: {}", cause)));
    }

    let lead = state
        .store
        .add_lead(
            extraction.name.clone(),
            extraction.email.clone(),
            extraction.phone.clone(),
            LeadSource::Document,
        )
        .await?;
    info!("Created lead {} from document", lead.id);

    trigger_lead_created(&state.store, &lead).await;
    Ok(Json(extraction).into_response())
}

/// Pull the first file field out of a multipart upload.
async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .ok_or_else(|| ApiError::bad_request("file field is missing a filename"))?
            .to_string();
        let content = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("failed to read upload: {}", e)))?;
        return Ok((filename, content.to_vec()));
    }
    Err(ApiError::bad_request("no file field in upload"))
}

pub async fn delete_lead(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state.store.delete_lead(id).await? {
        Some(lead) => {
            info!("Deleted lead: {}", lead.name);
            Ok(Json(json!({ "message": format!("Lead {} deleted successfully", id) })))
        }
        None => Err(ApiError::not_found("Lead not found")),
    }
}

pub async fn update_lead_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<StatusUpdate>,
) -> Result<Json<Lead>, ApiError> {
    let status = LeadStatus::from_str(&payload.status)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown status '{}'", payload.status)))?;

    match state.store.update_lead_status(id, status).await? {
        Some(lead) => {
            info!("Updated lead {} status to {}", id, status.as_str());
            Ok(Json(lead))
        }
        None => Err(ApiError::not_found("Lead not found")),
    }
}

pub async fn save_workflow(
    State(state): State<AppState>,
    Json(payload): Json<WorkflowRequest>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    validate_workflow(&payload.nodes, &payload.edges)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let now = Utc::now();
    let workflow = Workflow {
        id: format!("workflow-{}", Uuid::new_v4()),
        name: payload.name,
        description: payload.description,
        nodes: payload.nodes,
        edges: payload.edges,
        created_at: now,
        updated_at: now,
    };
    let workflow_id = workflow.id.clone();
    state.store.add_workflow(workflow).await?;
    info!("Saved workflow {}", workflow_id);

    Ok(Json(WorkflowResponse {
        message: "Workflow saved successfully".to_string(),
        workflow_id,
    }))
}

pub async fn list_workflows(State(state): State<AppState>) -> Json<serde_json::Value> {
    let workflows = state.store.workflows().await;
    Json(json!({ "workflows": workflows }))
}

pub async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state.store.delete_workflow(&id).await? {
        Some(workflow) => {
            info!("Deleted workflow: {}", workflow.name);
            Ok(Json(json!({ "message": format!("Workflow {} deleted successfully", id) })))
        }
        None => Err(ApiError::not_found("Workflow not found")),
    }
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let backend = state.extractor.backend();
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "leads_count": state.store.leads().await.len(),
        "workflows_count": state.store.workflows().await.len(),
        "ocr_backend": backend.backend_type().as_str(),
        "ocr_available": backend.is_available(),
    }))
}
