//! Flat-file persistence for leads and workflows.
//!
//! Leads live in `leads.json`, workflows in `workflows.json`, both under
//! the data directory. Missing files start empty. Every mutation persists
//! immediately; the store is the single writer for both files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::models::{Lead, LeadSource, LeadStatus, Workflow};

const LEADS_FILE: &str = "leads.json";
const WORKFLOWS_FILE: &str = "workflows.json";

/// On-disk shape of the workflows file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WorkflowFile {
    workflows: Vec<Workflow>,
    #[serde(default)]
    last_updated: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct StoreData {
    leads: Vec<Lead>,
    workflows: WorkflowFile,
    next_id: u64,
}

/// Flat-file store for leads and workflows.
pub struct LeadStore {
    data_dir: PathBuf,
    inner: RwLock<StoreData>,
}

impl LeadStore {
    /// Open the store, loading any existing data files.
    pub async fn open(data_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("creating data dir {}", data_dir.display()))?;

        let leads: Vec<Lead> = read_json_or_default(&data_dir.join(LEADS_FILE)).await?;
        let workflows: WorkflowFile = read_json_or_default(&data_dir.join(WORKFLOWS_FILE)).await?;
        let next_id = leads.iter().map(|l| l.id).max().unwrap_or(0) + 1;

        info!(
            leads = leads.len(),
            workflows = workflows.workflows.len(),
            "Lead store opened"
        );

        Ok(Self {
            data_dir,
            inner: RwLock::new(StoreData {
                leads,
                workflows,
                next_id,
            }),
        })
    }

    /// Create and persist a new lead.
    pub async fn add_lead(
        &self,
        name: String,
        email: String,
        phone: String,
        source: LeadSource,
    ) -> anyhow::Result<Lead> {
        let mut data = self.inner.write().await;
        let lead = Lead {
            id: data.next_id,
            name,
            email,
            phone,
            status: LeadStatus::New,
            source,
            created_at: Utc::now(),
        };
        data.next_id += 1;
        data.leads.push(lead.clone());
        self.persist_leads(&data).await?;
        Ok(lead)
    }

    /// All leads, in insertion order.
    pub async fn leads(&self) -> Vec<Lead> {
        self.inner.read().await.leads.clone()
    }

    pub async fn lead(&self, id: u64) -> Option<Lead> {
        self.inner
            .read()
            .await
            .leads
            .iter()
            .find(|l| l.id == id)
            .cloned()
    }

    /// Delete a lead by id. Returns the removed lead, if any.
    pub async fn delete_lead(&self, id: u64) -> anyhow::Result<Option<Lead>> {
        let mut data = self.inner.write().await;
        let index = data.leads.iter().position(|l| l.id == id);
        let removed = index.map(|i| data.leads.remove(i));
        if removed.is_some() {
            self.persist_leads(&data).await?;
        }
        Ok(removed)
    }

    /// Update a lead's status. Returns the updated lead, if found.
    pub async fn update_lead_status(
        &self,
        id: u64,
        status: LeadStatus,
    ) -> anyhow::Result<Option<Lead>> {
        let mut data = self.inner.write().await;
        let updated = data.leads.iter_mut().find(|l| l.id == id).map(|lead| {
            lead.status = status;
            lead.clone()
        });
        if updated.is_some() {
            self.persist_leads(&data).await?;
        }
        Ok(updated)
    }

    /// Store a workflow.
    pub async fn add_workflow(&self, workflow: Workflow) -> anyhow::Result<()> {
        let mut data = self.inner.write().await;
        data.workflows.workflows.push(workflow);
        self.persist_workflows(&mut data).await
    }

    /// All stored workflows.
    pub async fn workflows(&self) -> Vec<Workflow> {
        self.inner.read().await.workflows.workflows.clone()
    }

    /// Delete a workflow by id. Returns the removed workflow, if any.
    pub async fn delete_workflow(&self, id: &str) -> anyhow::Result<Option<Workflow>> {
        let mut data = self.inner.write().await;
        let index = data.workflows.workflows.iter().position(|w| w.id == id);
        let removed = index.map(|i| data.workflows.workflows.remove(i));
        if removed.is_some() {
            self.persist_workflows(&mut data).await?;
        }
        Ok(removed)
    }

    async fn persist_leads(&self, data: &StoreData) -> anyhow::Result<()> {
        write_json(&self.data_dir.join(LEADS_FILE), &data.leads).await
    }

    async fn persist_workflows(&self, data: &mut StoreData) -> anyhow::Result<()> {
        data.workflows.last_updated = Some(Utc::now());
        write_json(&self.data_dir.join(WORKFLOWS_FILE), &data.workflows).await
    }
}

async fn read_json_or_default<T: Default + for<'de> Deserialize<'de>>(
    path: &Path,
) -> anyhow::Result<T> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("{} not found, starting empty", path.display());
            Ok(T::default())
        }
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, LeadStore) {
        let temp = TempDir::new().unwrap();
        let store = LeadStore::open(temp.path()).await.unwrap();
        (temp, store)
    }

    #[tokio::test]
    async fn test_leads_persist_across_reopen() {
        let (temp, store) = store().await;
        let lead = store
            .add_lead(
                "John Smith".into(),
                "john@example.com".into(),
                "555-123-4567".into(),
                LeadSource::Manual,
            )
            .await
            .unwrap();
        assert_eq!(lead.id, 1);
        drop(store);

        let reopened = LeadStore::open(temp.path()).await.unwrap();
        let leads = reopened.leads().await;
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].name, "John Smith");

        // Ids keep counting from the highest seen.
        let second = reopened
            .add_lead(
                "Jane Doe".into(),
                "jane@example.com".into(),
                "555-987-6543".into(),
                LeadSource::Document,
            )
            .await
            .unwrap();
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_status_update_and_delete() {
        let (_temp, store) = store().await;
        let lead = store
            .add_lead(
                "John Smith".into(),
                "john@example.com".into(),
                "555-123-4567".into(),
                LeadSource::Manual,
            )
            .await
            .unwrap();

        let updated = store
            .update_lead_status(lead.id, LeadStatus::Contacted)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, LeadStatus::Contacted);

        assert!(store.delete_lead(lead.id).await.unwrap().is_some());
        assert!(store.delete_lead(lead.id).await.unwrap().is_none());
        assert!(store.leads().await.is_empty());
    }
}
