// Database rows (internal, converted to/from the wire DTOs)

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use flowgate_contracts::{
    DefinitionStatus, HistoryAction, InstanceStatus, WorkflowDefinition, WorkflowHistoryEntry,
    WorkflowInstance,
};

#[derive(Debug, Clone, FromRow)]
pub struct DefinitionRow {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub workflow_type: String,
    pub version: i32,
    pub status: String,
    pub steps: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DefinitionRow> for WorkflowDefinition {
    type Error = anyhow::Error;

    fn try_from(row: DefinitionRow) -> Result<Self, Self::Error> {
        Ok(WorkflowDefinition {
            id: row.id,
            company_id: row.company_id,
            name: row.name,
            workflow_type: row.workflow_type,
            version: row.version,
            status: DefinitionStatus::from(row.status.as_str()),
            steps: serde_json::from_value(row.steps)
                .with_context(|| format!("malformed steps column on definition {}", row.id))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct InstanceRow {
    pub id: Uuid,
    pub company_id: Uuid,
    pub definition_id: Uuid,
    pub business_type: String,
    pub business_id: Uuid,
    pub status: String,
    pub current_step_index: i32,
    pub steps: serde_json::Value,
    pub variables: serde_json::Value,
    pub initiator_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub revision: i64,
}

impl TryFrom<InstanceRow> for WorkflowInstance {
    type Error = anyhow::Error;

    fn try_from(row: InstanceRow) -> Result<Self, Self::Error> {
        Ok(WorkflowInstance {
            id: row.id,
            company_id: row.company_id,
            definition_id: row.definition_id,
            business_type: row.business_type,
            business_id: row.business_id,
            status: row
                .status
                .parse::<InstanceStatus>()
                .map_err(anyhow::Error::msg)?,
            current_step_index: usize::try_from(row.current_step_index)
                .context("negative step index")?,
            steps: serde_json::from_value(row.steps)
                .with_context(|| format!("malformed steps column on instance {}", row.id))?,
            variables: serde_json::from_value(row.variables)
                .with_context(|| format!("malformed variables column on instance {}", row.id))?,
            initiator_id: row.initiator_id,
            start_date: row.start_date,
            end_date: row.end_date,
            revision: row.revision,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct HistoryRow {
    pub id: Uuid,
    pub company_id: Uuid,
    pub instance_id: Uuid,
    pub step_id: Option<Uuid>,
    pub action: String,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub actor_role: String,
    pub description: String,
    pub metadata: serde_json::Value,
    pub changes: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for WorkflowHistoryEntry {
    type Error = anyhow::Error;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(WorkflowHistoryEntry {
            id: row.id,
            company_id: row.company_id,
            instance_id: row.instance_id,
            step_id: row.step_id,
            action: row
                .action
                .parse::<HistoryAction>()
                .map_err(anyhow::Error::msg)?,
            actor_id: row.actor_id,
            actor_name: row.actor_name,
            actor_role: row.actor_role,
            description: row.description,
            metadata: serde_json::from_value(row.metadata).unwrap_or_default(),
            changes: serde_json::from_value(row.changes).unwrap_or_default(),
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance_row(status: &str, steps: serde_json::Value) -> InstanceRow {
        InstanceRow {
            id: Uuid::now_v7(),
            company_id: Uuid::now_v7(),
            definition_id: Uuid::now_v7(),
            business_type: "recruitment_approval".to_string(),
            business_id: Uuid::now_v7(),
            status: status.to_string(),
            current_step_index: 0,
            steps,
            variables: json!({}),
            initiator_id: Uuid::now_v7(),
            start_date: Utc::now(),
            end_date: None,
            revision: 1,
        }
    }

    #[test]
    fn instance_row_converts() {
        let step_id = Uuid::now_v7();
        let steps = json!([{
            "id": step_id,
            "name": "HR screen",
            "kind": "approval",
            "assigneeRule": {"kind": "role", "value": "hr_manager"},
            "isOptional": false,
            "status": "in_progress",
            "attachments": [],
            "startedAt": Utc::now()
        }]);

        let instance: WorkflowInstance = instance_row("active", steps).try_into().unwrap();
        assert_eq!(instance.status, InstanceStatus::Active);
        assert_eq!(instance.steps.len(), 1);
        assert_eq!(instance.steps[0].id, step_id);
    }

    #[test]
    fn instance_row_rejects_unknown_status() {
        let result: Result<WorkflowInstance, _> =
            instance_row("exploded", json!([])).try_into();
        assert!(result.is_err());
    }

    #[test]
    fn instance_row_rejects_malformed_steps() {
        let result: Result<WorkflowInstance, _> =
            instance_row("active", json!({"not": "a list"})).try_into();
        assert!(result.is_err());
    }

    #[test]
    fn history_row_converts() {
        let row = HistoryRow {
            id: Uuid::now_v7(),
            company_id: Uuid::now_v7(),
            instance_id: Uuid::now_v7(),
            step_id: None,
            action: "cancelled".to_string(),
            actor_id: Uuid::now_v7(),
            actor_name: "Dana".to_string(),
            actor_role: "hr_manager".to_string(),
            description: "workflow cancelled".to_string(),
            metadata: json!({"reason": "withdrawn"}),
            changes: json!({}),
            created_at: Utc::now(),
        };

        let entry: WorkflowHistoryEntry = row.try_into().unwrap();
        assert_eq!(entry.action, HistoryAction::Cancelled);
        assert_eq!(entry.metadata.get("reason"), Some(&json!("withdrawn")));
    }
}
