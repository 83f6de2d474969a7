// Integration tests for the Flowgate API
// Run with: cargo test --test integration_test -- --ignored
// Requires a running server (DATABASE_URL configured) on localhost:9000

use flowgate_contracts::{
    CreateInstanceResponse, HistoryAction, InstanceDetail, InstanceStatus, StepStatus,
    WorkflowDefinition, WorkflowInstance,
};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::json;
use uuid::Uuid;

const API_BASE_URL: &str = "http://localhost:9000";

fn identity_headers(company_id: Uuid) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-actor-id",
        HeaderValue::from_str(&Uuid::now_v7().to_string()).unwrap(),
    );
    headers.insert(
        "x-company-id",
        HeaderValue::from_str(&company_id.to_string()).unwrap(),
    );
    headers.insert("x-actor-name", HeaderValue::from_static("Integration Bot"));
    headers.insert("x-actor-role", HeaderValue::from_static("hr_manager"));
    headers
}

#[tokio::test]
#[ignore] // Run with: cargo test --test integration_test -- --ignored
async fn test_full_approval_workflow() {
    let company_id = Uuid::now_v7();
    let client = reqwest::Client::builder()
        .default_headers(identity_headers(company_id))
        .build()
        .unwrap();

    // Step 1: Create a two-step approval definition
    let create_def = client
        .post(format!("{}/workflow/definitions", API_BASE_URL))
        .json(&json!({
            "name": "Recruitment approval",
            "workflowType": "recruitment_approval",
            "steps": [
                {"name": "HR screen", "kind": "approval", "assigneeRule": {"kind": "role", "value": "hr_manager"}},
                {"name": "Director sign-off", "kind": "approval", "assigneeRule": {"kind": "role", "value": "director"}}
            ]
        }))
        .send()
        .await
        .expect("Failed to create definition");
    assert_eq!(create_def.status(), 201);
    let definition: WorkflowDefinition = create_def.json().await.expect("parse definition");
    assert_eq!(definition.steps.len(), 2);

    // Step 2: Start an instance
    let create_inst = client
        .post(format!("{}/workflow/instance", API_BASE_URL))
        .json(&json!({
            "workflowDefinitionId": definition.id,
            "businessType": "recruitment_approval",
            "businessId": Uuid::now_v7(),
            "variables": {"position": "Backend engineer"}
        }))
        .send()
        .await
        .expect("Failed to create instance");
    assert_eq!(create_inst.status(), 201);
    let created: CreateInstanceResponse = create_inst.json().await.expect("parse instance id");

    // Step 3: Fetch the detail; step 0 in progress, one history entry
    let detail: InstanceDetail = client
        .get(format!("{}/workflow/instance", API_BASE_URL))
        .query(&[("instanceId", created.instance_id.to_string())])
        .send()
        .await
        .expect("Failed to fetch instance")
        .json()
        .await
        .expect("parse detail");
    assert_eq!(detail.instance.status, InstanceStatus::Active);
    assert_eq!(detail.instance.current_step_index, 0);
    assert_eq!(detail.instance.steps[0].status, StepStatus::InProgress);
    assert_eq!(detail.approval_records.len(), 1);
    assert_eq!(detail.approval_records[0].action, HistoryAction::StepStarted);

    // Step 4: Approve step 0 via the decision endpoint
    let approve = client
        .put(format!("{}/workflow/instance", API_BASE_URL))
        .json(&json!({
            "instanceId": created.instance_id,
            "nodeId": detail.instance.steps[0].id,
            "action": "approve",
            "comment": "good candidate"
        }))
        .send()
        .await
        .expect("Failed to approve");
    assert_eq!(approve.status(), 200);
    let instance: WorkflowInstance = approve.json().await.expect("parse instance");
    assert_eq!(instance.current_step_index, 1);
    assert_eq!(instance.steps[1].status, StepStatus::InProgress);

    // Step 5: Approving the stale step again loses with 409
    let stale = client
        .put(format!("{}/workflow/instance", API_BASE_URL))
        .json(&json!({
            "instanceId": created.instance_id,
            "nodeId": detail.instance.steps[0].id,
            "action": "approve"
        }))
        .send()
        .await
        .expect("Failed to send stale approval");
    assert_eq!(stale.status(), 409);

    // Step 6: Submit the final step; the instance completes
    let submit = client
        .post(format!(
            "{}/workflows/instances/{}/submit",
            API_BASE_URL, created.instance_id
        ))
        .json(&json!({
            "stepId": instance.steps[1].id,
            "result": "approved",
            "formData": {"offerBand": "L4"}
        }))
        .send()
        .await
        .expect("Failed to submit final step");
    assert_eq!(submit.status(), 200);
    let finished: WorkflowInstance = submit.json().await.expect("parse instance");
    assert_eq!(finished.status, InstanceStatus::Completed);
    assert!(finished.end_date.is_some());

    // Step 7: Cancelling a completed instance is rejected
    let cancel = client
        .post(format!(
            "{}/workflows/instances/{}/cancel",
            API_BASE_URL, created.instance_id
        ))
        .json(&json!({"reason": "too late"}))
        .send()
        .await
        .expect("Failed to send cancel");
    assert_eq!(cancel.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_pause_resume_cycle() {
    let company_id = Uuid::now_v7();
    let client = reqwest::Client::builder()
        .default_headers(identity_headers(company_id))
        .build()
        .unwrap();

    let definition: WorkflowDefinition = client
        .post(format!("{}/workflow/definitions", API_BASE_URL))
        .json(&json!({
            "name": "Subscription approval",
            "workflowType": "subscription_approval",
            "steps": [
                {"name": "Finance review", "kind": "approval", "assigneeRule": {"kind": "role", "value": "finance"}}
            ]
        }))
        .send()
        .await
        .expect("Failed to create definition")
        .json()
        .await
        .expect("parse definition");

    let created: CreateInstanceResponse = client
        .post(format!("{}/workflow/instance", API_BASE_URL))
        .json(&json!({
            "workflowDefinitionId": definition.id,
            "businessType": "subscription_approval",
            "businessId": Uuid::now_v7()
        }))
        .send()
        .await
        .expect("Failed to create instance")
        .json()
        .await
        .expect("parse instance id");

    let pause_url = format!(
        "{}/workflows/instances/{}/pause",
        API_BASE_URL, created.instance_id
    );

    let paused = client
        .post(&pause_url)
        .json(&json!({"action": "pause", "reason": "billing audit"}))
        .send()
        .await
        .expect("Failed to pause");
    assert_eq!(paused.status(), 200);

    // Submitting while paused is rejected
    let blocked = client
        .post(format!(
            "{}/workflows/instances/{}/submit",
            API_BASE_URL, created.instance_id
        ))
        .json(&json!({"stepId": definition.steps[0].id}))
        .send()
        .await
        .expect("Failed to send submit");
    assert_eq!(blocked.status(), 409);

    let resumed = client
        .post(&pause_url)
        .json(&json!({"action": "resume"}))
        .send()
        .await
        .expect("Failed to resume");
    assert_eq!(resumed.status(), 200);
    let instance: WorkflowInstance = resumed.json().await.expect("parse instance");
    assert_eq!(instance.status, InstanceStatus::Active);
}

#[tokio::test]
#[ignore]
async fn test_missing_identity_rejected() {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/workflow/definitions", API_BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);
}
