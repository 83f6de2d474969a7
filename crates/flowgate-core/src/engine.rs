// Workflow engine: instance creation, step advancement, approval handling,
// pause/resume/cancel, and completion detection.
//
// The engine owns every status/index transition; callers only ever supply
// step results. Each mutating operation follows the same shape: load the
// instance, validate the transition against what was read, build the new
// state plus its history entries, then hand both to the store as one
// conditional write. A lost race surfaces to the caller as
// InvalidStepTransition so it can re-fetch and re-present.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use flowgate_contracts::{
    Actor, ApprovalAction, AssigneeRule, CreateInstanceRequest, DecisionRequest, HistoryAction,
    InstanceStatus, InstanceStep, StepKind, StepStatus, SubmitStepRequest, WorkflowHistoryEntry,
    WorkflowInstance,
};

use crate::error::{Result, WorkflowError};
use crate::ports::{DefinitionStore, HistoryStore, InstanceStore, Notifier, StoreError};

pub struct WorkflowEngine {
    definitions: Arc<dyn DefinitionStore>,
    instances: Arc<dyn InstanceStore>,
    history: Arc<dyn HistoryStore>,
    notifier: Arc<dyn Notifier>,
}

impl WorkflowEngine {
    pub fn new(
        definitions: Arc<dyn DefinitionStore>,
        instances: Arc<dyn InstanceStore>,
        history: Arc<dyn HistoryStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            definitions,
            instances,
            history,
            notifier,
        }
    }

    /// Create a running instance from an active definition.
    ///
    /// Deep-copies the definition's steps, puts step 0 in progress, and
    /// writes the `step_started` entry in the same transaction as the
    /// instance row.
    pub async fn create_instance(
        &self,
        actor: &Actor,
        req: CreateInstanceRequest,
    ) -> Result<WorkflowInstance> {
        let definition = self
            .definitions
            .get(req.workflow_definition_id, actor.company_id)
            .await
            .map_err(read_failure)?
            .filter(|d| d.status == flowgate_contracts::DefinitionStatus::Active)
            .filter(|d| !d.steps.is_empty())
            .ok_or(WorkflowError::DefinitionNotFound(
                req.workflow_definition_id,
            ))?;

        let now = Utc::now();
        let steps: Vec<InstanceStep> = definition
            .steps
            .iter()
            .enumerate()
            .map(|(i, sd)| InstanceStep {
                id: sd.id,
                name: sd.name.clone(),
                kind: sd.kind,
                assignee_rule: sd.assignee_rule.clone(),
                is_optional: sd.is_optional,
                status: if i == 0 {
                    StepStatus::InProgress
                } else {
                    StepStatus::Pending
                },
                assignee_id: resolve_assignee(&sd.assignee_rule, actor),
                result: None,
                comments: None,
                attachments: Vec::new(),
                started_at: (i == 0).then_some(now),
                finished_at: None,
            })
            .collect();

        let instance = WorkflowInstance {
            id: Uuid::now_v7(),
            company_id: actor.company_id,
            definition_id: definition.id,
            business_type: req.business_type,
            business_id: req.business_id,
            status: InstanceStatus::Active,
            current_step_index: 0,
            steps,
            variables: req.variables,
            initiator_id: actor.id,
            start_date: now,
            end_date: None,
            revision: 1,
        };

        let first_step = &instance.steps[0];
        let entry = history_entry(
            &instance,
            actor,
            HistoryAction::StepStarted,
            Some(first_step.id),
            format!("workflow started; step '{}' entered", first_step.name),
        );

        self.instances
            .insert(&instance, &entry)
            .await
            .map_err(read_failure)?;

        tracing::info!(
            instance_id = %instance.id,
            definition_id = %definition.id,
            business_type = %instance.business_type,
            "workflow instance created"
        );
        self.fire(self.notifier.step_entered(&instance, first_step))
            .await;

        Ok(instance)
    }

    /// Submit the current step's result and optionally advance.
    ///
    /// Only the step at `current_step_index` is submittable; anything else
    /// fails with `InvalidStepTransition` and leaves the instance unchanged.
    pub async fn submit_step(
        &self,
        instance_id: Uuid,
        actor: &Actor,
        req: SubmitStepRequest,
    ) -> Result<WorkflowInstance> {
        self.complete_current_step(
            instance_id,
            actor,
            req,
            HistoryAction::StepCompleted,
            None,
        )
        .await
    }

    /// Approval decision on the current step. `Approve` submits with
    /// advancement; `Reject` records the decision without advancing —
    /// routing after a rejection is the caller's call, never implicit.
    pub async fn decide(&self, actor: &Actor, req: DecisionRequest) -> Result<WorkflowInstance> {
        let (result, action, advance) = match req.action {
            ApprovalAction::Approve => ("approved", HistoryAction::Approved, true),
            ApprovalAction::Reject => ("rejected", HistoryAction::Rejected, false),
        };

        let instance_id = req.instance_id;
        let submit = SubmitStepRequest {
            step_id: req.node_id,
            result: Some(result.to_string()),
            comments: req.comment,
            form_data: serde_json::Map::new(),
            attachments: Vec::new(),
            advance_to_next: advance,
        };

        self.complete_current_step(instance_id, actor, submit, action, Some(StepKind::Approval))
            .await
    }

    /// Shared completion path for submit_step and decide
    async fn complete_current_step(
        &self,
        instance_id: Uuid,
        actor: &Actor,
        req: SubmitStepRequest,
        completion_action: HistoryAction,
        required_kind: Option<StepKind>,
    ) -> Result<WorkflowInstance> {
        let mut instance = self.load(instance_id).await?;

        if instance.status.is_terminal() {
            return Err(WorkflowError::AlreadyTerminal {
                instance_id,
                current_status: instance.status,
            });
        }
        if instance.status != InstanceStatus::Active {
            return Err(WorkflowError::WorkflowNotActive {
                instance_id,
                current_status: instance.status,
            });
        }

        let idx = instance.current_step_index;
        let current_status = instance.status;
        let step = instance.steps.get(idx).ok_or_else(|| {
            WorkflowError::Persistence(anyhow::anyhow!(
                "instance {instance_id} carries out-of-range step index {idx}"
            ))
        })?;

        if step.id != req.step_id {
            return Err(WorkflowError::wrong_step(
                instance_id,
                Some(step.id),
                req.step_id,
                current_status,
            ));
        }
        if step.status != StepStatus::InProgress {
            return Err(WorkflowError::InvalidStepTransition {
                instance_id,
                reason: format!("step {} is not in progress (status: {})", step.id, step.status),
                expected_step_id: Some(step.id),
                current_status,
            });
        }
        if let Some(kind) = required_kind {
            if step.kind != kind {
                return Err(WorkflowError::InvalidStepTransition {
                    instance_id,
                    reason: format!("step {} is not an approval step", step.id),
                    expected_step_id: Some(step.id),
                    current_status,
                });
            }
        }

        let now = Utc::now();
        let expected_revision = instance.revision;
        instance.revision += 1;

        {
            let step = &mut instance.steps[idx];
            step.status = StepStatus::Completed;
            step.result = req.result.clone();
            step.comments = req.comments.clone();
            step.attachments = req.attachments.clone();
            step.finished_at = Some(now);
        }
        for (key, value) in req.form_data {
            instance.variables.insert(key, value);
        }

        let completed_step = instance.steps[idx].clone();
        let mut entries = vec![history_entry(
            &instance,
            actor,
            completion_action,
            Some(completed_step.id),
            format!(
                "step '{}' completed with result {:?}",
                completed_step.name, req.result
            ),
        )];

        let mut entered_step = None;
        if req.advance_to_next {
            if idx + 1 < instance.steps.len() {
                instance.current_step_index = idx + 1;
                let next = &mut instance.steps[idx + 1];
                next.status = StepStatus::InProgress;
                next.started_at = Some(now);
                let next = instance.steps[idx + 1].clone();
                entries.push(history_entry(
                    &instance,
                    actor,
                    HistoryAction::StepStarted,
                    Some(next.id),
                    format!("step '{}' entered", next.name),
                ));
                entered_step = Some(next);
            } else {
                instance.status = InstanceStatus::Completed;
                instance.end_date = Some(now);
                entries.push(history_entry(
                    &instance,
                    actor,
                    HistoryAction::Completed,
                    None,
                    "workflow completed".to_string(),
                ));
            }
        }

        self.commit(&instance, expected_revision, &entries, Some(req.step_id))
            .await?;

        tracing::info!(
            instance_id = %instance.id,
            step_id = %completed_step.id,
            action = %completion_action,
            status = %instance.status,
            "step submitted"
        );

        self.fire(self.notifier.step_exited(&instance, &completed_step))
            .await;
        if let Some(next) = &entered_step {
            self.fire(self.notifier.step_entered(&instance, next)).await;
        }
        if instance.status == InstanceStatus::Completed {
            self.fire(self.notifier.instance_finished(&instance)).await;
        }

        Ok(instance)
    }

    /// Freeze an active instance in place. Step statuses are untouched.
    pub async fn pause(
        &self,
        instance_id: Uuid,
        actor: &Actor,
        reason: Option<String>,
    ) -> Result<WorkflowInstance> {
        self.transition_status(
            instance_id,
            actor,
            "pause",
            InstanceStatus::Active,
            InstanceStatus::Paused,
            HistoryAction::Paused,
            reason,
        )
        .await
    }

    /// Return a paused instance to active
    pub async fn resume(&self, instance_id: Uuid, actor: &Actor) -> Result<WorkflowInstance> {
        self.transition_status(
            instance_id,
            actor,
            "resume",
            InstanceStatus::Paused,
            InstanceStatus::Active,
            HistoryAction::Resumed,
            None,
        )
        .await
    }

    /// Cancel from any non-terminal status. Step records are preserved
    /// as-is for the audit trail.
    pub async fn cancel(
        &self,
        instance_id: Uuid,
        actor: &Actor,
        reason: Option<String>,
    ) -> Result<WorkflowInstance> {
        let mut instance = self.load(instance_id).await?;

        if instance.status.is_terminal() {
            return Err(WorkflowError::AlreadyTerminal {
                instance_id,
                current_status: instance.status,
            });
        }

        let prior_status = instance.status;
        let expected_revision = instance.revision;
        instance.revision += 1;
        instance.status = InstanceStatus::Cancelled;
        instance.end_date = Some(Utc::now());

        let mut entry = history_entry(
            &instance,
            actor,
            HistoryAction::Cancelled,
            None,
            format!(
                "workflow cancelled (was {prior_status}): {}",
                reason.as_deref().unwrap_or("no reason given")
            ),
        );
        entry
            .metadata
            .insert("priorStatus".into(), prior_status.to_string().into());
        if let Some(reason) = reason {
            entry.metadata.insert("reason".into(), reason.into());
        }

        self.commit(&instance, expected_revision, std::slice::from_ref(&entry), None)
            .await?;

        tracing::info!(instance_id = %instance.id, prior_status = %prior_status, "workflow cancelled");
        self.fire(self.notifier.instance_finished(&instance)).await;

        Ok(instance)
    }

    /// Fetch an instance
    pub async fn get_instance(&self, instance_id: Uuid) -> Result<WorkflowInstance> {
        self.load(instance_id).await
    }

    /// Fetch an instance's audit trail in chronological order
    pub async fn get_history(&self, instance_id: Uuid) -> Result<Vec<WorkflowHistoryEntry>> {
        // Existence check so a bad id is a 404, not an empty list
        self.load(instance_id).await?;
        self.history
            .list_for_instance(instance_id)
            .await
            .map_err(read_failure)
    }

    async fn transition_status(
        &self,
        instance_id: Uuid,
        actor: &Actor,
        verb: &'static str,
        from: InstanceStatus,
        to: InstanceStatus,
        action: HistoryAction,
        reason: Option<String>,
    ) -> Result<WorkflowInstance> {
        let mut instance = self.load(instance_id).await?;

        if instance.status.is_terminal() {
            return Err(WorkflowError::AlreadyTerminal {
                instance_id,
                current_status: instance.status,
            });
        }
        if instance.status != from {
            return Err(WorkflowError::InvalidStateTransition {
                instance_id,
                action: verb,
                current_status: instance.status,
            });
        }

        let expected_revision = instance.revision;
        instance.revision += 1;
        instance.status = to;

        let mut entry = history_entry(
            &instance,
            actor,
            action,
            None,
            match &reason {
                Some(reason) => format!("workflow {action}: {reason}"),
                None => format!("workflow {action}"),
            },
        );
        entry
            .changes
            .insert("status".into(), serde_json::json!({"from": from.to_string(), "to": to.to_string()}));
        if let Some(reason) = reason {
            entry.metadata.insert("reason".into(), reason.into());
        }

        self.commit(&instance, expected_revision, std::slice::from_ref(&entry), None)
            .await?;

        tracing::info!(instance_id = %instance.id, from = %from, to = %to, "workflow status changed");
        Ok(instance)
    }

    async fn load(&self, instance_id: Uuid) -> Result<WorkflowInstance> {
        self.instances
            .get(instance_id)
            .await
            .map_err(read_failure)?
            .ok_or(WorkflowError::InstanceNotFound(instance_id))
    }

    /// Conditional write of the instance plus its history entries. A
    /// revision conflict means another caller transitioned the instance
    /// first; the loser gets InvalidStepTransition and must re-fetch.
    async fn commit(
        &self,
        instance: &WorkflowInstance,
        expected_revision: i64,
        entries: &[WorkflowHistoryEntry],
        submitted_step: Option<Uuid>,
    ) -> Result<()> {
        self.instances
            .update(instance, expected_revision, entries)
            .await
            .map_err(|err| match err {
                StoreError::RevisionConflict => {
                    WorkflowError::lost_race(instance.id, submitted_step, instance.status)
                }
                StoreError::NotFound => WorkflowError::InstanceNotFound(instance.id),
                StoreError::Backend(err) => WorkflowError::Persistence(err),
            })
    }

    async fn fire(&self, hook: impl std::future::Future<Output = anyhow::Result<()>>) {
        // Notification delivery must never fail a committed transition
        if let Err(err) = hook.await {
            tracing::warn!(error = %err, "notification hook failed");
        }
    }
}

fn resolve_assignee(rule: &AssigneeRule, actor: &Actor) -> Option<Uuid> {
    match rule {
        AssigneeRule::User(id) => Some(*id),
        AssigneeRule::Initiator => Some(actor.id),
        // Role holders are resolved by the caller's authorization layer
        AssigneeRule::Role(_) => None,
    }
}

fn history_entry(
    instance: &WorkflowInstance,
    actor: &Actor,
    action: HistoryAction,
    step_id: Option<Uuid>,
    description: String,
) -> WorkflowHistoryEntry {
    WorkflowHistoryEntry {
        id: Uuid::now_v7(),
        company_id: instance.company_id,
        instance_id: instance.id,
        step_id,
        action,
        actor_id: actor.id,
        actor_name: actor.name.clone(),
        actor_role: actor.role.clone(),
        description,
        metadata: serde_json::Map::new(),
        changes: serde_json::Map::new(),
        created_at: Utc::now(),
    }
}

fn read_failure(err: StoreError) -> WorkflowError {
    match err {
        StoreError::Backend(err) => WorkflowError::Persistence(err),
        // NotFound / RevisionConflict are not produced by reads or inserts;
        // treat them as backend corruption if they ever surface here
        other => WorkflowError::Persistence(anyhow::anyhow!(other)),
    }
}
