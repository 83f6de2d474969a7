// Workflow instance DTOs (one running execution of a definition)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::definition::{AssigneeRule, StepKind};

/// Overall instance status.
/// `Completed` and `Cancelled` are terminal; nothing transitions out of them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Cancelled,
    Error,
}

impl InstanceStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InstanceStatus::Completed | InstanceStatus::Cancelled)
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InstanceStatus::Draft => "draft",
            InstanceStatus::Active => "active",
            InstanceStatus::Paused => "paused",
            InstanceStatus::Completed => "completed",
            InstanceStatus::Cancelled => "cancelled",
            InstanceStatus::Error => "error",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for InstanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InstanceStatus::Draft),
            "active" => Ok(InstanceStatus::Active),
            "paused" => Ok(InstanceStatus::Paused),
            "completed" => Ok(InstanceStatus::Completed),
            "cancelled" => Ok(InstanceStatus::Cancelled),
            "error" => Ok(InstanceStatus::Error),
            other => Err(format!("unknown instance status: {other}")),
        }
    }
}

/// Status of a single step within an instance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Skipped,
    Error,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in_progress",
            StepStatus::Completed => "completed",
            StepStatus::Skipped => "skipped",
            StepStatus::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// Runtime copy of a step definition, augmented with execution state
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstanceStep {
    pub id: Uuid,
    pub name: String,
    pub kind: StepKind,
    pub assignee_rule: AssigneeRule,
    #[serde(default)]
    pub is_optional: bool,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Uuid>,
    /// Outcome recorded on completion, e.g. "approved" or "rejected"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// A running workflow, tied to one business record (e.g. one candidate)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInstance {
    pub id: Uuid,
    pub company_id: Uuid,
    pub definition_id: Uuid,
    #[schema(example = "recruitment_approval")]
    pub business_type: String,
    /// The domain entity this workflow gates
    pub business_id: Uuid,
    pub status: InstanceStatus,
    /// 0-based; meaningful only while status is active or paused
    pub current_step_index: usize,
    pub steps: Vec<InstanceStep>,
    /// Free-form key/value bag carried across steps
    #[serde(default)]
    #[schema(value_type = Object)]
    pub variables: serde_json::Map<String, serde_json::Value>,
    pub initiator_id: Uuid,
    pub start_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Optimistic-concurrency counter; every successful mutation increments it
    pub revision: i64,
}

impl WorkflowInstance {
    /// The step at `current_step_index`, if the index is in range
    pub fn current_step(&self) -> Option<&InstanceStep> {
        self.steps.get(self.current_step_index)
    }
}

/// Request to start a workflow instance
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstanceRequest {
    pub workflow_definition_id: Uuid,
    #[schema(example = "recruitment_approval")]
    pub business_type: String,
    pub business_id: Uuid,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub variables: serde_json::Map<String, serde_json::Value>,
}

/// Response to instance creation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstanceResponse {
    pub instance_id: Uuid,
}

/// Approval decision on an approval-type step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalAction {
    Approve,
    Reject,
}

/// Request body for the approval decision endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub instance_id: Uuid,
    /// Id of the approval step being decided
    pub node_id: Uuid,
    pub action: ApprovalAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Request body for submitting the current step's result
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitStepRequest {
    pub step_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "approved")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    /// Merged into the instance's `variables` bag
    #[serde(default)]
    #[schema(value_type = Object)]
    pub form_data: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default = "default_advance")]
    pub advance_to_next: bool,
}

fn default_advance() -> bool {
    true
}

/// Pause or resume an instance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PauseAction {
    Pause,
    Resume,
}

/// Request body for the pause/resume endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PauseRequest {
    pub action: PauseAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "candidate on leave")]
    pub reason: Option<String>,
}

/// Request body for the cancel endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "requisition withdrawn")]
    pub reason: Option<String>,
}

/// Instance plus its audit trail, as returned by the detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDetail {
    pub instance: WorkflowInstance,
    pub approval_records: Vec<crate::history::WorkflowHistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(InstanceStatus::Completed.is_terminal());
        assert!(InstanceStatus::Cancelled.is_terminal());
        assert!(!InstanceStatus::Active.is_terminal());
        assert!(!InstanceStatus::Paused.is_terminal());
        assert!(!InstanceStatus::Draft.is_terminal());
        assert!(!InstanceStatus::Error.is_terminal());
    }

    #[test]
    fn step_status_wire_format() {
        let json = serde_json::to_string(&StepStatus::InProgress).unwrap();
        assert_eq!(json, r#""in_progress""#);
    }

    #[test]
    fn submit_request_defaults_advance() {
        let step_id = Uuid::now_v7();
        let json = format!(r#"{{"stepId": "{step_id}"}}"#);
        let req: SubmitStepRequest = serde_json::from_str(&json).unwrap();
        assert!(req.advance_to_next);
        assert!(req.form_data.is_empty());
        assert!(req.attachments.is_empty());
    }
}
