// Workflow instance HTTP routes
//
// All transitions are caller-driven: the engine never advances an
// instance on its own. Races between two approvers surface as 409.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

use flowgate_contracts::{
    CancelRequest, CreateInstanceRequest, CreateInstanceResponse, DecisionRequest, ErrorBody,
    InstanceDetail, PauseAction, PauseRequest, SubmitStepRequest, WorkflowInstance,
};
use flowgate_core::WorkflowEngine;

use crate::actor::ActorIdentity;
use crate::common::ApiError;

/// App state for instance routes
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<WorkflowEngine>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/workflow/instance",
            post(create_instance).put(decide).get(get_instance),
        )
        .route("/workflows/instances/:id/submit", post(submit_step))
        .route("/workflows/instances/:id/pause", post(pause_or_resume))
        .route("/workflows/instances/:id/cancel", post(cancel))
        .with_state(state)
}

/// POST /workflow/instance - Start a workflow instance from a definition
#[utoipa::path(
    post,
    path = "/workflow/instance",
    request_body = CreateInstanceRequest,
    responses(
        (status = 201, description = "Instance created", body = CreateInstanceResponse),
        (status = 401, description = "Missing actor identity"),
        (status = 404, description = "Definition missing or inactive", body = ErrorBody),
        (status = 503, description = "Storage unavailable")
    ),
    tag = "instances"
)]
pub async fn create_instance(
    State(state): State<AppState>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<CreateInstanceRequest>,
) -> Result<(StatusCode, Json<CreateInstanceResponse>), ApiError> {
    let instance = state.engine.create_instance(&actor, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateInstanceResponse {
            instance_id: instance.id,
        }),
    ))
}

/// PUT /workflow/instance - Approve or reject the current approval step
///
/// A rejection is recorded but never auto-advances or terminates the
/// instance; what happens next is the caller's decision.
#[utoipa::path(
    put,
    path = "/workflow/instance",
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Decision recorded", body = WorkflowInstance),
        (status = 404, description = "Instance not found", body = ErrorBody),
        (status = 409, description = "Step is not the current step, or decision race lost", body = ErrorBody)
    ),
    tag = "instances"
)]
pub async fn decide(
    State(state): State<AppState>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<DecisionRequest>,
) -> Result<Json<WorkflowInstance>, ApiError> {
    let instance = state.engine.decide(&actor, req).await?;
    Ok(Json(instance))
}

/// Query parameters for the instance detail endpoint
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct InstanceQuery {
    pub instance_id: Uuid,
}

/// GET /workflow/instance?instanceId= - Instance plus its audit trail
#[utoipa::path(
    get,
    path = "/workflow/instance",
    params(InstanceQuery),
    responses(
        (status = 200, description = "Instance detail", body = InstanceDetail),
        (status = 404, description = "Instance not found", body = ErrorBody)
    ),
    tag = "instances"
)]
pub async fn get_instance(
    State(state): State<AppState>,
    ActorIdentity(_actor): ActorIdentity,
    Query(query): Query<InstanceQuery>,
) -> Result<Json<InstanceDetail>, ApiError> {
    let instance = state.engine.get_instance(query.instance_id).await?;
    let approval_records = state.engine.get_history(query.instance_id).await?;
    Ok(Json(InstanceDetail {
        instance,
        approval_records,
    }))
}

/// POST /workflows/instances/{id}/submit - Submit the current step's result
#[utoipa::path(
    post,
    path = "/workflows/instances/{id}/submit",
    params(("id" = Uuid, Path, description = "Instance ID")),
    request_body = SubmitStepRequest,
    responses(
        (status = 200, description = "Step submitted", body = WorkflowInstance),
        (status = 404, description = "Instance not found", body = ErrorBody),
        (status = 409, description = "Not the current step, or instance not active", body = ErrorBody)
    ),
    tag = "instances"
)]
pub async fn submit_step(
    State(state): State<AppState>,
    ActorIdentity(actor): ActorIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitStepRequest>,
) -> Result<Json<WorkflowInstance>, ApiError> {
    let instance = state.engine.submit_step(id, &actor, req).await?;
    Ok(Json(instance))
}

/// POST /workflows/instances/{id}/pause - Pause or resume an instance
#[utoipa::path(
    post,
    path = "/workflows/instances/{id}/pause",
    params(("id" = Uuid, Path, description = "Instance ID")),
    request_body = PauseRequest,
    responses(
        (status = 200, description = "Status changed", body = WorkflowInstance),
        (status = 404, description = "Instance not found", body = ErrorBody),
        (status = 409, description = "Incompatible current status", body = ErrorBody)
    ),
    tag = "instances"
)]
pub async fn pause_or_resume(
    State(state): State<AppState>,
    ActorIdentity(actor): ActorIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<PauseRequest>,
) -> Result<Json<WorkflowInstance>, ApiError> {
    let instance = match req.action {
        PauseAction::Pause => state.engine.pause(id, &actor, req.reason).await?,
        PauseAction::Resume => state.engine.resume(id, &actor).await?,
    };
    Ok(Json(instance))
}

/// POST /workflows/instances/{id}/cancel - Cancel from any non-terminal status
#[utoipa::path(
    post,
    path = "/workflows/instances/{id}/cancel",
    params(("id" = Uuid, Path, description = "Instance ID")),
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Instance cancelled", body = WorkflowInstance),
        (status = 404, description = "Instance not found", body = ErrorBody),
        (status = 409, description = "Instance already terminal", body = ErrorBody)
    ),
    tag = "instances"
)]
pub async fn cancel(
    State(state): State<AppState>,
    ActorIdentity(actor): ActorIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<WorkflowInstance>, ApiError> {
    let instance = state.engine.cancel(id, &actor, req.reason).await?;
    Ok(Json(instance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgate_contracts::ApprovalAction;

    #[test]
    fn create_request_minimal() {
        let def_id = Uuid::now_v7();
        let biz_id = Uuid::now_v7();
        let json = format!(
            r#"{{"workflowDefinitionId": "{def_id}", "businessType": "recruitment_approval", "businessId": "{biz_id}"}}"#
        );
        let req: CreateInstanceRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req.workflow_definition_id, def_id);
        assert!(req.variables.is_empty());
    }

    #[test]
    fn decision_request_reject() {
        let instance_id = Uuid::now_v7();
        let node_id = Uuid::now_v7();
        let json = format!(
            r#"{{"instanceId": "{instance_id}", "nodeId": "{node_id}", "action": "reject", "comment": "budget hold"}}"#
        );
        let req: DecisionRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req.action, ApprovalAction::Reject);
        assert_eq!(req.comment.as_deref(), Some("budget hold"));
    }

    #[test]
    fn pause_request_parses_both_actions() {
        let pause: PauseRequest =
            serde_json::from_str(r#"{"action": "pause", "reason": "audit"}"#).unwrap();
        assert_eq!(pause.action, PauseAction::Pause);
        let resume: PauseRequest = serde_json::from_str(r#"{"action": "resume"}"#).unwrap();
        assert_eq!(resume.action, PauseAction::Resume);
        assert_eq!(resume.reason, None);
    }

    #[test]
    fn submit_request_full() {
        let step_id = Uuid::now_v7();
        let json = format!(
            r#"{{"stepId": "{step_id}", "result": "approved", "comments": "ok",
                 "formData": {{"headcount": 2}}, "attachments": ["s3://offer.pdf"],
                 "advanceToNext": false}}"#
        );
        let req: SubmitStepRequest = serde_json::from_str(&json).unwrap();
        assert!(!req.advance_to_next);
        assert_eq!(req.form_data.get("headcount"), Some(&serde_json::json!(2)));
        assert_eq!(req.attachments, vec!["s3://offer.pdf"]);
    }

    #[test]
    fn cancel_request_reason_optional() {
        let req: CancelRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.reason, None);
    }
}
