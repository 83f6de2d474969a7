// Error-to-HTTP mapping for the workflow API
//
// Validation errors carry enough context (current status, expected step)
// for the caller's UI to refresh and re-present valid actions.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use flowgate_contracts::ErrorBody;
use flowgate_core::WorkflowError;

/// Wrapper so WorkflowError can be returned straight from handlers
pub struct ApiError(pub WorkflowError);

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = match &err {
            WorkflowError::DefinitionNotFound(_) | WorkflowError::InstanceNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            WorkflowError::InvalidStepTransition { .. }
            | WorkflowError::WorkflowNotActive { .. }
            | WorkflowError::InvalidStateTransition { .. }
            | WorkflowError::AlreadyTerminal { .. } => StatusCode::CONFLICT,
            WorkflowError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(error = %err, "persistence failure");
        } else {
            tracing::debug!(error = %err, "request rejected");
        }

        let (current_status, expected_step_id) = match &err {
            WorkflowError::InvalidStepTransition {
                current_status,
                expected_step_id,
                ..
            } => (Some(current_status.to_string()), *expected_step_id),
            WorkflowError::WorkflowNotActive { current_status, .. }
            | WorkflowError::InvalidStateTransition { current_status, .. }
            | WorkflowError::AlreadyTerminal { current_status, .. } => {
                (Some(current_status.to_string()), None)
            }
            _ => (None, None),
        };

        let body = ErrorBody {
            error: err.code().to_string(),
            message: err.to_string(),
            current_status,
            expected_step_id,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgate_contracts::InstanceStatus;
    use uuid::Uuid;

    #[test]
    fn not_found_maps_to_404() {
        let resp = ApiError(WorkflowError::InstanceNotFound(Uuid::now_v7())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn step_transition_maps_to_409() {
        let resp = ApiError(WorkflowError::wrong_step(
            Uuid::now_v7(),
            Some(Uuid::now_v7()),
            Uuid::now_v7(),
            InstanceStatus::Active,
        ))
        .into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn persistence_maps_to_503() {
        let resp =
            ApiError(WorkflowError::Persistence(anyhow::anyhow!("pool closed"))).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
