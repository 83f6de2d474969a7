// Notifier implementations that ship with the engine.
//
// Real delivery (email/SMS) lives outside this service; these cover
// structured logging and tests.

use async_trait::async_trait;

use flowgate_contracts::{InstanceStep, WorkflowInstance};

use crate::ports::Notifier;

/// Emits a tracing event per notification. The default for the server.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn step_entered(
        &self,
        instance: &WorkflowInstance,
        step: &InstanceStep,
    ) -> anyhow::Result<()> {
        tracing::info!(
            instance_id = %instance.id,
            step_id = %step.id,
            step_name = %step.name,
            assignee_id = ?step.assignee_id,
            "step entered"
        );
        Ok(())
    }

    async fn step_exited(
        &self,
        instance: &WorkflowInstance,
        step: &InstanceStep,
    ) -> anyhow::Result<()> {
        tracing::info!(
            instance_id = %instance.id,
            step_id = %step.id,
            result = ?step.result,
            "step exited"
        );
        Ok(())
    }

    async fn instance_finished(&self, instance: &WorkflowInstance) -> anyhow::Result<()> {
        tracing::info!(
            instance_id = %instance.id,
            status = %instance.status,
            "instance finished"
        );
        Ok(())
    }
}

/// Does nothing. For tests that only care about state transitions.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn step_entered(
        &self,
        _instance: &WorkflowInstance,
        _step: &InstanceStep,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn step_exited(
        &self,
        _instance: &WorkflowInstance,
        _step: &InstanceStep,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn instance_finished(&self, _instance: &WorkflowInstance) -> anyhow::Result<()> {
        Ok(())
    }
}
