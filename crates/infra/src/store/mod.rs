//! Store implementations: in-memory for dev/tests, Postgres for deployments.

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryCredentialStore, InMemoryPostStore, InMemoryRoleStore};
pub use postgres::{PostgresCredentialStore, PostgresPostStore, PostgresRoleStore, migrate};
