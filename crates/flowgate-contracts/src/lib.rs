// Public contracts for the Flowgate workflow API
// This crate defines the DTOs shared by the engine, the storage adapter,
// and the REST binding. Field names follow the wire format (camelCase).

pub mod actor;
pub mod common;
pub mod definition;
pub mod history;
pub mod instance;

pub use actor::*;
pub use common::*;
pub use definition::*;
pub use history::*;
pub use instance::*;
