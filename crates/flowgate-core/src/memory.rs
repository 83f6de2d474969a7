// In-memory store for examples and testing
//
// Keeps all data in tokio-RwLock-guarded maps. The instance map write lock
// spans the revision check and the history append, giving the same
// atomicity and serialization guarantees the Postgres adapter gets from a
// transaction with a conditional UPDATE.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use flowgate_contracts::{
    DefinitionStatus, WorkflowDefinition, WorkflowHistoryEntry, WorkflowInstance,
};

use crate::ports::{DefinitionStore, HistoryStore, InstanceStore, StoreError};

/// In-memory implementation of all three persistence ports
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    definitions: Arc<RwLock<HashMap<Uuid, WorkflowDefinition>>>,
    instances: Arc<RwLock<HashMap<Uuid, WorkflowInstance>>>,
    history: Arc<RwLock<HashMap<Uuid, Vec<WorkflowHistoryEntry>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total history entries across all instances (useful in tests)
    pub async fn history_len(&self, instance_id: Uuid) -> usize {
        self.history
            .read()
            .await
            .get(&instance_id)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl DefinitionStore for MemoryStore {
    async fn insert(
        &self,
        definition: WorkflowDefinition,
    ) -> Result<WorkflowDefinition, StoreError> {
        self.definitions
            .write()
            .await
            .insert(definition.id, definition.clone());
        Ok(definition)
    }

    async fn get(
        &self,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<WorkflowDefinition>, StoreError> {
        Ok(self
            .definitions
            .read()
            .await
            .get(&id)
            .filter(|d| d.company_id == company_id)
            .cloned())
    }

    async fn list(&self, company_id: Uuid) -> Result<Vec<WorkflowDefinition>, StoreError> {
        let mut defs: Vec<WorkflowDefinition> = self
            .definitions
            .read()
            .await
            .values()
            .filter(|d| d.company_id == company_id)
            .cloned()
            .collect();
        defs.sort_by_key(|d| d.created_at);
        Ok(defs)
    }

    async fn archive(&self, id: Uuid, company_id: Uuid) -> Result<bool, StoreError> {
        let mut defs = self.definitions.write().await;
        match defs.get_mut(&id) {
            Some(d) if d.company_id == company_id && d.status == DefinitionStatus::Active => {
                d.status = DefinitionStatus::Archived;
                d.updated_at = chrono::Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl InstanceStore for MemoryStore {
    async fn insert(
        &self,
        instance: &WorkflowInstance,
        history: &WorkflowHistoryEntry,
    ) -> Result<(), StoreError> {
        let mut instances = self.instances.write().await;
        instances.insert(instance.id, instance.clone());
        self.history
            .write()
            .await
            .entry(instance.id)
            .or_default()
            .push(history.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<WorkflowInstance>, StoreError> {
        Ok(self.instances.read().await.get(&id).cloned())
    }

    async fn update(
        &self,
        instance: &WorkflowInstance,
        expected_revision: i64,
        history: &[WorkflowHistoryEntry],
    ) -> Result<(), StoreError> {
        let mut instances = self.instances.write().await;
        let stored = instances.get_mut(&instance.id).ok_or(StoreError::NotFound)?;
        if stored.revision != expected_revision {
            return Err(StoreError::RevisionConflict);
        }
        *stored = instance.clone();
        self.history
            .write()
            .await
            .entry(instance.id)
            .or_default()
            .extend_from_slice(history);
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn list_for_instance(
        &self,
        instance_id: Uuid,
    ) -> Result<Vec<WorkflowHistoryEntry>, StoreError> {
        Ok(self
            .history
            .read()
            .await
            .get(&instance_id)
            .cloned()
            .unwrap_or_default())
    }
}
