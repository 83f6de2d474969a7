// Postgres implementation of the persistence ports

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use flowgate_contracts::{WorkflowDefinition, WorkflowHistoryEntry, WorkflowInstance};
use flowgate_core::{DefinitionStore, HistoryStore, InstanceStore, StoreError};

use crate::models::{DefinitionRow, HistoryRow, InstanceRow};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to run migrations")?;
        tracing::debug!("schema migrations applied");
        Ok(())
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(anyhow::Error::new(err))
}

async fn append_history(
    tx: &mut Transaction<'_, Postgres>,
    entry: &WorkflowHistoryEntry,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO workflow_history
            (id, company_id, instance_id, step_id, action, actor_id, actor_name, actor_role,
             description, metadata, changes, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(entry.id)
    .bind(entry.company_id)
    .bind(entry.instance_id)
    .bind(entry.step_id)
    .bind(entry.action.to_string())
    .bind(entry.actor_id)
    .bind(&entry.actor_name)
    .bind(&entry.actor_role)
    .bind(&entry.description)
    .bind(serde_json::Value::Object(entry.metadata.clone()))
    .bind(serde_json::Value::Object(entry.changes.clone()))
    .bind(entry.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl DefinitionStore for PgStore {
    async fn insert(
        &self,
        definition: WorkflowDefinition,
    ) -> Result<WorkflowDefinition, StoreError> {
        let steps = serde_json::to_value(&definition.steps)
            .map_err(|e| StoreError::Backend(anyhow::Error::new(e)))?;

        let row = sqlx::query_as::<_, DefinitionRow>(
            r#"
            INSERT INTO workflow_definitions
                (id, company_id, name, workflow_type, version, status, steps, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, company_id, name, workflow_type, version, status, steps, created_at, updated_at
            "#,
        )
        .bind(definition.id)
        .bind(definition.company_id)
        .bind(&definition.name)
        .bind(&definition.workflow_type)
        .bind(definition.version)
        .bind(definition.status.to_string())
        .bind(steps)
        .bind(definition.created_at)
        .bind(definition.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        row.try_into().map_err(StoreError::Backend)
    }

    async fn get(
        &self,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<WorkflowDefinition>, StoreError> {
        let row = sqlx::query_as::<_, DefinitionRow>(
            r#"
            SELECT id, company_id, name, workflow_type, version, status, steps, created_at, updated_at
            FROM workflow_definitions
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(TryInto::try_into)
            .transpose()
            .map_err(StoreError::Backend)
    }

    async fn list(&self, company_id: Uuid) -> Result<Vec<WorkflowDefinition>, StoreError> {
        let rows = sqlx::query_as::<_, DefinitionRow>(
            r#"
            SELECT id, company_id, name, workflow_type, version, status, steps, created_at, updated_at
            FROM workflow_definitions
            WHERE company_id = $1 AND status = 'active'
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter()
            .map(TryInto::try_into)
            .collect::<Result<_, _>>()
            .map_err(StoreError::Backend)
    }

    async fn archive(&self, id: Uuid, company_id: Uuid) -> Result<bool, StoreError> {
        // Archive instead of hard delete; running instances keep their own
        // copy of the steps
        let result = sqlx::query(
            r#"
            UPDATE workflow_definitions
            SET status = 'archived', updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND status = 'active'
            "#,
        )
        .bind(id)
        .bind(company_id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl InstanceStore for PgStore {
    async fn insert(
        &self,
        instance: &WorkflowInstance,
        history: &WorkflowHistoryEntry,
    ) -> Result<(), StoreError> {
        let steps = serde_json::to_value(&instance.steps)
            .map_err(|e| StoreError::Backend(anyhow::Error::new(e)))?;

        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            r#"
            INSERT INTO workflow_instances
                (id, company_id, definition_id, business_type, business_id, status,
                 current_step_index, steps, variables, initiator_id, start_date, end_date, revision)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(instance.id)
        .bind(instance.company_id)
        .bind(instance.definition_id)
        .bind(&instance.business_type)
        .bind(instance.business_id)
        .bind(instance.status.to_string())
        .bind(instance.current_step_index as i32)
        .bind(steps)
        .bind(serde_json::Value::Object(instance.variables.clone()))
        .bind(instance.initiator_id)
        .bind(instance.start_date)
        .bind(instance.end_date)
        .bind(instance.revision)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        append_history(&mut tx, history).await.map_err(backend)?;
        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<WorkflowInstance>, StoreError> {
        let row = sqlx::query_as::<_, InstanceRow>(
            r#"
            SELECT id, company_id, definition_id, business_type, business_id, status,
                   current_step_index, steps, variables, initiator_id, start_date, end_date, revision
            FROM workflow_instances
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(TryInto::try_into)
            .transpose()
            .map_err(StoreError::Backend)
    }

    async fn update(
        &self,
        instance: &WorkflowInstance,
        expected_revision: i64,
        history: &[WorkflowHistoryEntry],
    ) -> Result<(), StoreError> {
        let steps = serde_json::to_value(&instance.steps)
            .map_err(|e| StoreError::Backend(anyhow::Error::new(e)))?;

        let mut tx = self.pool.begin().await.map_err(backend)?;

        // Conditional write: the revision guard serializes racing writers
        let result = sqlx::query(
            r#"
            UPDATE workflow_instances
            SET status = $2,
                current_step_index = $3,
                steps = $4,
                variables = $5,
                end_date = $6,
                revision = $7
            WHERE id = $1 AND revision = $8
            "#,
        )
        .bind(instance.id)
        .bind(instance.status.to_string())
        .bind(instance.current_step_index as i32)
        .bind(steps)
        .bind(serde_json::Value::Object(instance.variables.clone()))
        .bind(instance.end_date)
        .bind(instance.revision)
        .bind(expected_revision)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(backend)?;
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM workflow_instances WHERE id = $1",
            )
            .bind(instance.id)
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
            return Err(if exists == 0 {
                StoreError::NotFound
            } else {
                StoreError::RevisionConflict
            });
        }

        for entry in history {
            append_history(&mut tx, entry).await.map_err(backend)?;
        }
        tx.commit().await.map_err(backend)?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for PgStore {
    async fn list_for_instance(
        &self,
        instance_id: Uuid,
    ) -> Result<Vec<WorkflowHistoryEntry>, StoreError> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, company_id, instance_id, step_id, action, actor_id, actor_name, actor_role,
                   description, metadata, changes, created_at
            FROM workflow_history
            WHERE instance_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(instance_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter()
            .map(TryInto::try_into)
            .collect::<Result<_, _>>()
            .map_err(StoreError::Backend)
    }
}
