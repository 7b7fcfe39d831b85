//! Rule-based workflow validation and execution.
//!
//! Workflows fire on lead-creation events and run a short chain of
//! actions: send an email or update the lead's status. Email delivery is
//! out of scope here; sends are recorded in the execution log only.

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Lead, LeadStatus, WorkflowEdge, WorkflowNode};
use crate::storage::LeadStore;

/// Maximum action nodes allowed in a single workflow.
const MAX_ACTION_NODES: usize = 3;

/// Trigger label every workflow must start from.
const LEAD_CREATED_LABEL: &str = "Lead Created";

/// Workflow structure validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum WorkflowError {
    #[error("No nodes provided")]
    NoNodes,

    #[error("No trigger node found")]
    NoTrigger,

    #[error("Lead Created trigger is required")]
    MissingLeadCreatedTrigger,

    #[error("Maximum 3 action nodes allowed")]
    TooManyActions,

    #[error("Edge references non-existent node: {source} -> {target}")]
    DanglingEdge { source: String, target: String },
}

/// Validate a workflow graph before storing or executing it.
///
/// Rules: a trigger node must exist, it must be the `Lead Created`
/// trigger, at most [`MAX_ACTION_NODES`] action nodes, and every edge
/// endpoint must reference an existing node.
pub fn validate_workflow(
    nodes: &[WorkflowNode],
    edges: &[WorkflowEdge],
) -> Result<(), WorkflowError> {
    if nodes.is_empty() {
        return Err(WorkflowError::NoNodes);
    }

    if !nodes.iter().any(|n| n.kind() == "trigger") {
        return Err(WorkflowError::NoTrigger);
    }

    let lead_created = nodes
        .iter()
        .any(|n| n.kind() == "trigger" && n.data_str("label") == Some(LEAD_CREATED_LABEL));
    if !lead_created {
        return Err(WorkflowError::MissingLeadCreatedTrigger);
    }

    let actions = nodes.iter().filter(|n| n.kind() == "action").count();
    if actions > MAX_ACTION_NODES {
        return Err(WorkflowError::TooManyActions);
    }

    let node_ids: std::collections::HashSet<&str> =
        nodes.iter().map(|n| n.id.as_str()).collect();
    for edge in edges {
        if !node_ids.contains(edge.source.as_str()) || !node_ids.contains(edge.target.as_str()) {
            return Err(WorkflowError::DanglingEdge {
                source: edge.source.clone(),
                target: edge.target.clone(),
            });
        }
    }

    Ok(())
}

/// Outcome of one triggered workflow run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TriggeredWorkflow {
    pub workflow_id: String,
    pub workflow_name: String,
    pub execution_log: Vec<String>,
}

fn log_entry(log: &mut Vec<String>, message: impl AsRef<str>) {
    log.push(format!("[{}] {}", Utc::now().to_rfc3339(), message.as_ref()));
}

/// Run every stored workflow against a freshly created lead.
pub async fn trigger_lead_created(store: &LeadStore, lead: &Lead) -> Vec<TriggeredWorkflow> {
    info!("Triggering workflows for new lead: {}", lead.name);
    let mut triggered = Vec::new();

    for workflow in store.workflows().await {
        if !workflow.nodes.iter().any(|n| n.kind() == "trigger") {
            continue;
        }

        let mut log = Vec::new();
        log_entry(&mut log, format!("Triggered workflow: {}", workflow.name));
        log_entry(&mut log, format!("Lead: {} ({})", lead.name, lead.email));

        for node in &workflow.nodes {
            run_node(store, lead, node, &mut log).await;
        }

        triggered.push(TriggeredWorkflow {
            workflow_id: workflow.id.clone(),
            workflow_name: workflow.name.clone(),
            execution_log: log,
        });
    }

    triggered
}

/// Execute a single action node against a lead.
async fn run_node(store: &LeadStore, lead: &Lead, node: &WorkflowNode, log: &mut Vec<String>) {
    match action_kind(node) {
        "sendEmail" => {
            let subject = node.data_str("emailSubject").unwrap_or("Welcome to our CRM");
            let sender = node.data_str("senderName").unwrap_or("CRM System");
            // Delivery is a collaborator concern; record the send only.
            info!("Send Email: '{}' from {} to {}", subject, sender, lead.email);
            log_entry(
                log,
                format!("Send Email: {} from {} to {}", subject, sender, lead.email),
            );
        }
        "updateStatus" => {
            let status = node
                .data_str("status")
                .and_then(LeadStatus::from_str)
                .unwrap_or(LeadStatus::Contacted);
            let reason = node
                .data_str("updateReason")
                .unwrap_or("Workflow automation");
            match store.update_lead_status(lead.id, status).await {
                Ok(Some(_)) => log_entry(
                    log,
                    format!("Updated lead status to: {} - {}", status.as_str(), reason),
                ),
                Ok(None) => log_entry(log, format!("Lead {} no longer exists", lead.id)),
                Err(e) => {
                    warn!("Failed to update lead {} status: {}", lead.id, e);
                    log_entry(log, format!("Status update failed: {}", e));
                }
            }
        }
        "trigger" => {
            log_entry(
                log,
                format!(
                    "Trigger node: {}",
                    node.data_str("label").unwrap_or("Unknown trigger")
                ),
            );
        }
        other if !other.is_empty() => {
            log_entry(log, format!("Unknown node type: {}", other));
        }
        _ => {}
    }
}

/// Effective action kind of a node. Action nodes carry their concrete kind
/// either as the node type or under `data.type`.
fn action_kind(node: &WorkflowNode) -> &str {
    match node.kind() {
        "action" => node.data_str("type").unwrap_or("action"),
        kind => kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Workflow;
    use serde_json::json;
    use std::collections::HashMap;

    fn node(id: &str, node_type: &str, data: serde_json::Value) -> WorkflowNode {
        WorkflowNode {
            id: id.to_string(),
            node_type: node_type.to_string(),
            position: HashMap::new(),
            data,
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> WorkflowEdge {
        WorkflowEdge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    fn trigger() -> WorkflowNode {
        node("t1", "trigger", json!({"label": "Lead Created"}))
    }

    #[test]
    fn test_valid_workflow() {
        let nodes = vec![trigger(), node("a1", "action", json!({"type": "sendEmail"}))];
        let edges = vec![edge("e1", "t1", "a1")];
        assert_eq!(validate_workflow(&nodes, &edges), Ok(()));
    }

    #[test]
    fn test_empty_workflow_rejected() {
        assert_eq!(validate_workflow(&[], &[]), Err(WorkflowError::NoNodes));
    }

    #[test]
    fn test_trigger_must_be_lead_created() {
        let nodes = vec![node("t1", "trigger", json!({"label": "Deal Closed"}))];
        assert_eq!(
            validate_workflow(&nodes, &[]),
            Err(WorkflowError::MissingLeadCreatedTrigger)
        );
    }

    #[test]
    fn test_too_many_actions_rejected() {
        let mut nodes = vec![trigger()];
        for i in 0..4 {
            nodes.push(node(&format!("a{}", i), "action", json!({})));
        }
        assert_eq!(
            validate_workflow(&nodes, &[]),
            Err(WorkflowError::TooManyActions)
        );
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let nodes = vec![trigger()];
        let edges = vec![edge("e1", "t1", "ghost")];
        assert!(matches!(
            validate_workflow(&nodes, &edges),
            Err(WorkflowError::DanglingEdge { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_status_action_runs() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = crate::storage::LeadStore::open(temp.path()).await.unwrap();
        let lead = store
            .add_lead(
                "John Smith".into(),
                "john@example.com".into(),
                "555-123-4567".into(),
                crate::models::LeadSource::Document,
            )
            .await
            .unwrap();

        store
            .add_workflow(Workflow {
                id: "wf-1".into(),
                name: "Welcome".into(),
                description: String::new(),
                nodes: vec![
                    trigger(),
                    node("a1", "updateStatus", json!({"status": "Contacted"})),
                ],
                edges: vec![edge("e1", "t1", "a1")],
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();

        let triggered = trigger_lead_created(&store, &lead).await;
        assert_eq!(triggered.len(), 1);
        assert_eq!(
            store.lead(lead.id).await.unwrap().status,
            LeadStatus::Contacted
        );
    }
}
