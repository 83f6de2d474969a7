// Persistence and notification ports
//
// These traits allow the engine to be used with different backends:
// - In-memory implementations for tests and examples
// - Postgres implementations for production (flowgate-storage)

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use flowgate_contracts::{
    InstanceStep, WorkflowDefinition, WorkflowHistoryEntry, WorkflowInstance,
};

/// Errors surfaced by store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record addressed by the operation does not exist
    #[error("record not found")]
    NotFound,

    /// A conditional write was guarded by a stale revision; the caller lost
    /// a concurrent-update race
    #[error("revision conflict")]
    RevisionConflict,

    /// Backend failure (connection lost, transaction aborted, ...)
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Store for workflow definitions (templates). Definitions are read-only
/// once published; removal is an archive, never a hard delete.
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    async fn insert(
        &self,
        definition: WorkflowDefinition,
    ) -> Result<WorkflowDefinition, StoreError>;

    /// Fetch a definition scoped to its owning company
    async fn get(
        &self,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<WorkflowDefinition>, StoreError>;

    async fn list(&self, company_id: Uuid) -> Result<Vec<WorkflowDefinition>, StoreError>;

    /// Returns false when the definition was absent or already archived
    async fn archive(&self, id: Uuid, company_id: Uuid) -> Result<bool, StoreError>;
}

/// Store for workflow instances. The instance record is the only contended
/// resource in the system; every update is a conditional write guarded by
/// the revision the engine read, committed atomically with its history
/// entries.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// Persist a new instance together with its first history entry
    async fn insert(
        &self,
        instance: &WorkflowInstance,
        history: &WorkflowHistoryEntry,
    ) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<WorkflowInstance>, StoreError>;

    /// Persist `instance` (whose `revision` has already been incremented by
    /// the engine) only if the stored row still carries `expected_revision`,
    /// appending `history` in the same transaction. Fails with
    /// `RevisionConflict` when another writer got there first.
    async fn update(
        &self,
        instance: &WorkflowInstance,
        expected_revision: i64,
        history: &[WorkflowHistoryEntry],
    ) -> Result<(), StoreError>;
}

/// Read side of the audit trail
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Entries for one instance in chronological (creation) order
    async fn list_for_instance(
        &self,
        instance_id: Uuid,
    ) -> Result<Vec<WorkflowHistoryEntry>, StoreError>;
}

/// Hook into the delivery subsystem (email/SMS/in-app), fired after a
/// transition has committed. Failures must never roll back the transition;
/// the engine logs and moves on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn step_entered(
        &self,
        instance: &WorkflowInstance,
        step: &InstanceStep,
    ) -> anyhow::Result<()>;

    async fn step_exited(
        &self,
        instance: &WorkflowInstance,
        step: &InstanceStep,
    ) -> anyhow::Result<()>;

    /// Instance reached a terminal status
    async fn instance_finished(&self, instance: &WorkflowInstance) -> anyhow::Result<()>;
}
