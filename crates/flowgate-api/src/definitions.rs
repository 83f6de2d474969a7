// Workflow definition HTTP routes (administration)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use flowgate_contracts::{
    CreateDefinitionRequest, ErrorBody, ListResponse, WorkflowDefinition,
};

use crate::actor::ActorIdentity;
use crate::common::ApiError;
use crate::services::DefinitionService;

/// App state for definition routes
#[derive(Clone)]
pub struct AppState {
    pub definitions: Arc<DefinitionService>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/workflow/definitions",
            get(list_definitions).post(create_definition),
        )
        .route(
            "/workflow/definitions/:id",
            get(get_definition).delete(archive_definition),
        )
        .with_state(state)
}

/// POST /workflow/definitions - Create a workflow template
#[utoipa::path(
    post,
    path = "/workflow/definitions",
    request_body = CreateDefinitionRequest,
    responses(
        (status = 201, description = "Definition created", body = WorkflowDefinition),
        (status = 400, description = "Definition has no steps", body = ErrorBody),
        (status = 401, description = "Missing actor identity"),
        (status = 503, description = "Storage unavailable")
    ),
    tag = "definitions"
)]
pub async fn create_definition(
    State(state): State<AppState>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<CreateDefinitionRequest>,
) -> Result<(StatusCode, Json<WorkflowDefinition>), axum::response::Response> {
    if req.steps.is_empty() {
        return Err(bad_request("a workflow definition needs at least one step"));
    }

    let definition = state
        .definitions
        .create(&actor, req)
        .await
        .map_err(|e| axum::response::IntoResponse::into_response(ApiError(e)))?;

    Ok((StatusCode::CREATED, Json(definition)))
}

/// GET /workflow/definitions - List active definitions for the caller's company
#[utoipa::path(
    get,
    path = "/workflow/definitions",
    responses(
        (status = 200, description = "Active definitions", body = ListResponse<WorkflowDefinition>),
        (status = 401, description = "Missing actor identity")
    ),
    tag = "definitions"
)]
pub async fn list_definitions(
    State(state): State<AppState>,
    ActorIdentity(actor): ActorIdentity,
) -> Result<Json<ListResponse<WorkflowDefinition>>, ApiError> {
    let definitions = state.definitions.list(&actor).await?;
    Ok(Json(ListResponse::new(definitions)))
}

/// GET /workflow/definitions/{id} - Fetch one definition
#[utoipa::path(
    get,
    path = "/workflow/definitions/{id}",
    params(("id" = Uuid, Path, description = "Definition ID")),
    responses(
        (status = 200, description = "Definition found", body = WorkflowDefinition),
        (status = 404, description = "Definition not found", body = ErrorBody)
    ),
    tag = "definitions"
)]
pub async fn get_definition(
    State(state): State<AppState>,
    ActorIdentity(actor): ActorIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowDefinition>, ApiError> {
    let definition = state.definitions.get(id, &actor).await?;
    Ok(Json(definition))
}

/// DELETE /workflow/definitions/{id} - Archive a definition
///
/// Running instances are unaffected; they carry their own copy of the steps.
#[utoipa::path(
    delete,
    path = "/workflow/definitions/{id}",
    params(("id" = Uuid, Path, description = "Definition ID")),
    responses(
        (status = 204, description = "Definition archived"),
        (status = 404, description = "Definition not found or already archived", body = ErrorBody)
    ),
    tag = "definitions"
)]
pub async fn archive_definition(
    State(state): State<AppState>,
    ActorIdentity(actor): ActorIdentity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.definitions.archive(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn bad_request(message: &str) -> axum::response::Response {
    axum::response::IntoResponse::into_response((
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: "invalid_definition".to_string(),
            message: message.to_string(),
            current_status: None,
            expected_step_id: None,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use flowgate_contracts::{AssigneeRule, CreateDefinitionRequest, StepKind};

    #[test]
    fn create_request_deserializes() {
        let json = r#"{
            "name": "Recruitment approval",
            "workflowType": "recruitment_approval",
            "steps": [
                {"name": "HR screen", "kind": "approval", "assigneeRule": {"kind": "role", "value": "hr_manager"}},
                {"name": "Notify candidate", "kind": "notification", "assigneeRule": {"kind": "initiator"}, "isOptional": true}
            ]
        }"#;
        let req: CreateDefinitionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.steps.len(), 2);
        assert_eq!(req.steps[0].kind, StepKind::Approval);
        assert_eq!(
            req.steps[0].assignee_rule,
            AssigneeRule::Role("hr_manager".to_string())
        );
        assert!(!req.steps[0].is_optional);
        assert!(req.steps[1].is_optional);
        assert_eq!(req.steps[1].assignee_rule, AssigneeRule::Initiator);
    }
}
