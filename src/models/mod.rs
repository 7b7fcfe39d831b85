//! Data models for leadflow.

mod extraction;
mod lead;
mod workflow;

pub use extraction::LeadExtraction;
pub use lead::{Lead, LeadSource, LeadStatus};
pub use workflow::{Workflow, WorkflowEdge, WorkflowNode};
