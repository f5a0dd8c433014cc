//! `warden-core`: identifiers and validation errors shared by every layer.
//!
//! This crate has no knowledge of HTTP, storage, or authorization policy.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult, require_non_blank};
pub use id::{PostId, RoleId, UserId};
