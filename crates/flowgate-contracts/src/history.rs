// Audit trail DTOs. One entry per state transition, append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// What happened in one transition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    StepStarted,
    StepCompleted,
    Approved,
    Rejected,
    Paused,
    Resumed,
    Cancelled,
    Completed,
    Updated,
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HistoryAction::StepStarted => "step_started",
            HistoryAction::StepCompleted => "step_completed",
            HistoryAction::Approved => "approved",
            HistoryAction::Rejected => "rejected",
            HistoryAction::Paused => "paused",
            HistoryAction::Resumed => "resumed",
            HistoryAction::Cancelled => "cancelled",
            HistoryAction::Completed => "completed",
            HistoryAction::Updated => "updated",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for HistoryAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "step_started" => Ok(HistoryAction::StepStarted),
            "step_completed" => Ok(HistoryAction::StepCompleted),
            "approved" => Ok(HistoryAction::Approved),
            "rejected" => Ok(HistoryAction::Rejected),
            "paused" => Ok(HistoryAction::Paused),
            "resumed" => Ok(HistoryAction::Resumed),
            "cancelled" => Ok(HistoryAction::Cancelled),
            "completed" => Ok(HistoryAction::Completed),
            "updated" => Ok(HistoryAction::Updated),
            other => Err(format!("unknown history action: {other}")),
        }
    }
}

/// Immutable audit record of one state transition
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowHistoryEntry {
    pub id: Uuid,
    pub company_id: Uuid,
    pub instance_id: Uuid,
    /// Absent for instance-level transitions (pause, cancel, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<Uuid>,
    pub action: HistoryAction,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub actor_role: String,
    pub description: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Field-level before/after snapshots, when the transition changed instance fields
    #[serde(default)]
    #[schema(value_type = Object)]
    pub changes: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_wire_format() {
        assert_eq!(
            serde_json::to_string(&HistoryAction::StepStarted).unwrap(),
            r#""step_started""#
        );
        assert_eq!(
            serde_json::to_string(&HistoryAction::Rejected).unwrap(),
            r#""rejected""#
        );
    }

    #[test]
    fn display_matches_wire_format() {
        for action in [
            HistoryAction::StepStarted,
            HistoryAction::StepCompleted,
            HistoryAction::Approved,
            HistoryAction::Rejected,
            HistoryAction::Paused,
            HistoryAction::Resumed,
            HistoryAction::Cancelled,
            HistoryAction::Completed,
            HistoryAction::Updated,
        ] {
            let wire = serde_json::to_string(&action).unwrap();
            assert_eq!(wire, format!(r#""{action}""#));
        }
    }
}
