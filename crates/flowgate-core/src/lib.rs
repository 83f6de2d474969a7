// Workflow engine core
//
// The engine is stateless: all mutable state lives behind the persistence
// ports, so it can run against Postgres in production and the in-memory
// store in tests. Every mutating operation validates against the freshly
// read instance before writing, and commits the instance update together
// with its history entries or not at all.

pub mod engine;
pub mod error;
pub mod memory;
pub mod notify;
pub mod ports;

pub use engine::WorkflowEngine;
pub use error::{Result, WorkflowError};
pub use memory::MemoryStore;
pub use notify::{LogNotifier, NoopNotifier};
pub use ports::{DefinitionStore, HistoryStore, InstanceStore, Notifier, StoreError};
