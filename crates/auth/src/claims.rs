use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warden_core::UserId;

use crate::{AuthError, Identity};

/// Claims carried by a signed identity token.
///
/// `iat`/`exp` are Unix seconds so the payload stays a standard JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the identity id.
    pub sub: UserId,
    pub username: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn for_identity(identity: &Identity, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: identity.id,
            username: identity.username.clone(),
            email: identity.email.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

impl From<TokenValidationError> for AuthError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => AuthError::TokenExpired,
            TokenValidationError::NotYetValid | TokenValidationError::InvalidTimeWindow => {
                AuthError::TokenInvalid
            }
        }
    }
}

/// Validate the claim time window against `now`.
///
/// A token is valid on `[iat, exp)`: it expires exactly at `exp`.
/// Signature verification happens before this, in [`crate::TokenService`].
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn claims(iat: i64, exp: i64) -> Claims {
        Claims {
            sub: UserId::new(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            iat,
            exp,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn valid_strictly_before_expiry() {
        let c = claims(1_000, 4_600);
        assert_eq!(validate_claims(&c, at(1_000)), Ok(()));
        assert_eq!(validate_claims(&c, at(4_599)), Ok(()));
    }

    #[test]
    fn expires_exactly_at_exp() {
        let c = claims(1_000, 4_600);
        assert_eq!(validate_claims(&c, at(4_600)), Err(TokenValidationError::Expired));
        assert_eq!(AuthError::from(TokenValidationError::Expired), AuthError::TokenExpired);
    }

    #[test]
    fn future_and_inverted_windows_are_invalid() {
        assert_eq!(
            validate_claims(&claims(2_000, 5_600), at(1_999)),
            Err(TokenValidationError::NotYetValid)
        );
        assert_eq!(
            validate_claims(&claims(2_000, 2_000), at(2_000)),
            Err(TokenValidationError::InvalidTimeWindow)
        );
        assert_eq!(
            AuthError::from(TokenValidationError::NotYetValid),
            AuthError::TokenInvalid
        );
    }
}
