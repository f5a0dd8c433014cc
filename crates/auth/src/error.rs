//! Error taxonomy for the authentication/authorization boundary.

use thiserror::Error;

use warden_core::DomainError;

/// Result type used across `warden-auth`.
pub type AuthResult<T> = Result<T, AuthError>;

/// Failure reported by a credential or role store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint was violated (email, username, role name).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found")]
    NotFound,

    /// The backing store failed (connection, query, decode).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Every way a request can be rejected before it reaches a handler.
///
/// Messages are safe to show to clients: none of them reveal whether an
/// account exists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email and wrong password are deliberately indistinguishable.
    #[error("invalid email or password")]
    CredentialInvalid,

    #[error("email already in use")]
    EmailInUse,

    #[error("authentication token missing")]
    TokenMissing,

    #[error("authentication token invalid")]
    TokenInvalid,

    #[error("authentication token expired")]
    TokenExpired,

    /// The token verified but its subject no longer exists.
    #[error("identity not found")]
    IdentityNotFound,

    #[error("forbidden: missing permission '{0}'")]
    PermissionDenied(String),

    #[error("no matching roles found")]
    NoMatchingRoles,

    /// Hashing or signing primitive failed. Never user-facing.
    #[error("credential primitive failure: {0}")]
    Crypto(String),

    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn crypto(err: impl core::fmt::Display) -> Self {
        Self::Crypto(err.to_string())
    }

    /// True for the failures surfaced as "not authenticated" (401).
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::TokenMissing | Self::TokenInvalid | Self::TokenExpired | Self::CredentialInvalid
        )
    }
}
