// Postgres storage layer with sqlx
//
// PgStore implements the engine's persistence ports over a connection
// pool. Instance updates and their history entries commit in one
// transaction, with the revision column as the optimistic-concurrency
// guard.

pub mod models;
pub mod store;

pub use models::*;
pub use store::PgStore;
