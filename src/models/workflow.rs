//! Workflow graph models.
//!
//! Workflows are small node graphs authored in the frontend builder: one
//! trigger node plus up to a handful of action nodes connected by edges.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A node in a workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    /// Canvas position from the builder UI; carried through verbatim.
    #[serde(default)]
    pub position: HashMap<String, f64>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl WorkflowNode {
    /// Read a string value out of the node's data payload.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    /// Effective node kind. The builder has historically stored this both
    /// on the node and inside its data payload; check both.
    pub fn kind(&self) -> &str {
        if !self.node_type.is_empty() {
            &self.node_type
        } else {
            self.data_str("type").unwrap_or("")
        }
    }
}

/// A directed edge between two workflow nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// A stored workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
