//! Password hashing and verification (bcrypt).

use crate::{AuthError, AuthResult, PasswordDigest};

/// Work factor used when none is configured.
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

/// Hashes and checks passwords with a fixed work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialVerifier {
    cost: u32,
}

impl Default for CredentialVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl CredentialVerifier {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Salted, non-deterministic digest of `password`.
    pub fn hash(&self, password: &str) -> AuthResult<PasswordDigest> {
        bcrypt::hash(password, self.cost)
            .map(PasswordDigest::from_stored)
            .map_err(AuthError::crypto)
    }

    /// `Ok(false)` on mismatch; `Err(Crypto)` only if `digest` is malformed.
    pub fn verify(&self, password: &str, digest: &PasswordDigest) -> AuthResult<bool> {
        bcrypt::verify(password, digest.as_str()).map_err(AuthError::crypto)
    }
}
