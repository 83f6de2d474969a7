// Definition administration: templates are created whole, listed, and
// archived. Never edited in place — an edit is a new definition version.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use flowgate_contracts::{
    Actor, CreateDefinitionRequest, DefinitionStatus, StepDefinition, WorkflowDefinition,
};
use flowgate_core::{DefinitionStore, StoreError, WorkflowError};

pub struct DefinitionService {
    store: Arc<dyn DefinitionStore>,
}

impl DefinitionService {
    pub fn new(store: Arc<dyn DefinitionStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        req: CreateDefinitionRequest,
    ) -> Result<WorkflowDefinition, WorkflowError> {
        let now = Utc::now();
        let definition = WorkflowDefinition {
            id: Uuid::now_v7(),
            company_id: actor.company_id,
            name: req.name,
            workflow_type: req.workflow_type,
            version: 1,
            status: DefinitionStatus::Active,
            steps: req
                .steps
                .into_iter()
                .map(|s| StepDefinition {
                    id: Uuid::now_v7(),
                    name: s.name,
                    kind: s.kind,
                    assignee_rule: s.assignee_rule,
                    is_optional: s.is_optional,
                })
                .collect(),
            created_at: now,
            updated_at: now,
        };

        self.store
            .insert(definition)
            .await
            .map_err(persistence)
    }

    pub async fn get(&self, id: Uuid, actor: &Actor) -> Result<WorkflowDefinition, WorkflowError> {
        self.store
            .get(id, actor.company_id)
            .await
            .map_err(persistence)?
            .ok_or(WorkflowError::DefinitionNotFound(id))
    }

    pub async fn list(&self, actor: &Actor) -> Result<Vec<WorkflowDefinition>, WorkflowError> {
        self.store.list(actor.company_id).await.map_err(persistence)
    }

    pub async fn archive(&self, id: Uuid, actor: &Actor) -> Result<(), WorkflowError> {
        let archived = self
            .store
            .archive(id, actor.company_id)
            .await
            .map_err(persistence)?;
        if archived {
            Ok(())
        } else {
            Err(WorkflowError::DefinitionNotFound(id))
        }
    }
}

fn persistence(err: StoreError) -> WorkflowError {
    WorkflowError::Persistence(anyhow::Error::new(err))
}
