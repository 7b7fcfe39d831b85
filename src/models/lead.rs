//! Lead records and their lifecycle enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline status of a lead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Contacted => "Contacted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "New" => Some(Self::New),
            "Contacted" => Some(Self::Contacted),
            _ => None,
        }
    }
}

/// How a lead entered the system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadSource {
    Manual,
    #[default]
    Document,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Document => "Document",
        }
    }
}

/// A stored lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub status: LeadStatus,
    pub source: LeadSource,
    pub created_at: DateTime<Utc>,
}
