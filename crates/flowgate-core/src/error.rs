// Error types for the workflow engine

use flowgate_contracts::InstanceStatus;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Errors that can occur during workflow engine operations.
///
/// Validation errors are raised before any write happens; `Persistence` is
/// the only retryable class, and the caller must re-fetch state before
/// retrying (transitions are not idempotent).
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Referenced workflow template missing, inactive, or owned by another company
    #[error("workflow definition not found: {0}")]
    DefinitionNotFound(Uuid),

    /// Instance id does not resolve
    #[error("workflow instance not found: {0}")]
    InstanceNotFound(Uuid),

    /// Submission targets a step that is not the current step, or lost a
    /// concurrent-update race
    #[error("invalid step transition on instance {instance_id}: {reason}")]
    InvalidStepTransition {
        instance_id: Uuid,
        reason: String,
        expected_step_id: Option<Uuid>,
        current_status: InstanceStatus,
    },

    /// Submission attempted while the instance is not active
    #[error("workflow instance {instance_id} is not active (status: {current_status})")]
    WorkflowNotActive {
        instance_id: Uuid,
        current_status: InstanceStatus,
    },

    /// Pause/resume attempted from an incompatible status
    #[error("cannot {action} instance {instance_id} while {current_status}")]
    InvalidStateTransition {
        instance_id: Uuid,
        action: &'static str,
        current_status: InstanceStatus,
    },

    /// Mutation attempted on a completed or cancelled instance
    #[error("instance {instance_id} is in terminal status {current_status}")]
    AlreadyTerminal {
        instance_id: Uuid,
        current_status: InstanceStatus,
    },

    /// Underlying store unreachable or transaction aborted; retryable after re-fetch
    #[error("persistence failure: {0}")]
    Persistence(#[source] anyhow::Error),
}

impl WorkflowError {
    /// Create an invalid-step-transition error for a mismatched step id
    pub fn wrong_step(
        instance_id: Uuid,
        expected: Option<Uuid>,
        submitted: Uuid,
        current_status: InstanceStatus,
    ) -> Self {
        WorkflowError::InvalidStepTransition {
            instance_id,
            reason: format!("submitted step {submitted} is not the current step"),
            expected_step_id: expected,
            current_status,
        }
    }

    /// Create an invalid-step-transition error for a lost concurrent-update race
    pub fn lost_race(
        instance_id: Uuid,
        expected: Option<Uuid>,
        current_status: InstanceStatus,
    ) -> Self {
        WorkflowError::InvalidStepTransition {
            instance_id,
            reason: "instance was modified concurrently; re-fetch and retry".to_string(),
            expected_step_id: expected,
            current_status,
        }
    }

    /// Stable machine-readable code for the wire format
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::DefinitionNotFound(_) => "definition_not_found",
            WorkflowError::InstanceNotFound(_) => "instance_not_found",
            WorkflowError::InvalidStepTransition { .. } => "invalid_step_transition",
            WorkflowError::WorkflowNotActive { .. } => "workflow_not_active",
            WorkflowError::InvalidStateTransition { .. } => "invalid_state_transition",
            WorkflowError::AlreadyTerminal { .. } => "already_terminal",
            WorkflowError::Persistence(_) => "persistence_failure",
        }
    }
}
