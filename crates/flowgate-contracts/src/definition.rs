// Workflow definition DTOs (the reusable templates instances are created from)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Definition status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionStatus {
    Active,
    Archived,
}

impl std::fmt::Display for DefinitionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefinitionStatus::Active => write!(f, "active"),
            DefinitionStatus::Archived => write!(f, "archived"),
        }
    }
}

impl From<&str> for DefinitionStatus {
    fn from(s: &str) -> Self {
        match s {
            "archived" => DefinitionStatus::Archived,
            _ => DefinitionStatus::Active,
        }
    }
}

/// What a step is: an approval gate, a work item, or a pure notification.
/// Closed set so the engine can match each kind exhaustively.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Approval,
    Task,
    Notification,
}

/// Rule resolving who acts on a step when an instance reaches it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum AssigneeRule {
    /// A specific user
    User(Uuid),
    /// Any holder of a role, resolved by the caller's authorization layer
    Role(String),
    /// The actor who created the instance
    Initiator,
}

/// One stage in a workflow template
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    pub id: Uuid,
    pub name: String,
    pub kind: StepKind,
    pub assignee_rule: AssigneeRule,
    #[serde(default)]
    pub is_optional: bool,
}

/// A workflow template: an ordered step sequence owned by one company.
/// Immutable once referenced by an instance; edits create a new version.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    /// Business category, e.g. "recruitment_approval"
    #[schema(example = "recruitment_approval")]
    pub workflow_type: String,
    pub version: i32,
    pub status: DefinitionStatus,
    pub steps: Vec<StepDefinition>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a workflow definition
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDefinitionRequest {
    pub name: String,
    #[schema(example = "recruitment_approval")]
    pub workflow_type: String,
    pub steps: Vec<CreateStepDefinition>,
}

/// Step payload within a create-definition request; ids are assigned server-side
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStepDefinition {
    pub name: String,
    pub kind: StepKind,
    pub assignee_rule: AssigneeRule,
    #[serde(default)]
    pub is_optional: bool,
}
