//! Signed, time-bounded identity tokens (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::claims::validate_claims;
use crate::{AuthError, AuthResult, Claims, Identity};

/// Token lifetime when none is configured.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Issues and verifies identity tokens with one process-wide secret.
///
/// Stateless: nothing is remembered about issued tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `validate_claims` so it can run against an
        // injected clock with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn issue(&self, identity: &Identity) -> AuthResult<String> {
        self.issue_at(identity, Utc::now())
    }

    /// Deterministic for identical secret, identity and `now`.
    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> AuthResult<String> {
        let claims = Claims::for_identity(identity, now, self.ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AuthError::crypto)
    }

    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<Claims> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::TokenMissing);
        }

        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| AuthError::TokenInvalid)?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
