//! Identity resolution: bearer token → fully loaded identity.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::store::{CredentialStore, RoleStore, populate_roles};
use crate::{AuthError, AuthResult, ResolvedIdentity, TokenService};

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header: Option<&str>) -> AuthResult<&str> {
    let header = header.ok_or(AuthError::TokenMissing)?;
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::TokenMissing)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::TokenMissing);
    }
    Ok(token)
}

/// Verifies tokens and loads the identity (with role records) they name.
#[derive(Clone)]
pub struct IdentityResolver {
    tokens: Arc<TokenService>,
    credentials: Arc<dyn CredentialStore>,
    roles: Arc<dyn RoleStore>,
}

impl IdentityResolver {
    pub fn new(
        tokens: Arc<TokenService>,
        credentials: Arc<dyn CredentialStore>,
        roles: Arc<dyn RoleStore>,
    ) -> Self {
        Self {
            tokens,
            credentials,
            roles,
        }
    }

    /// Authenticate from a raw `Authorization` header value.
    pub async fn authenticate_header(&self, header: Option<&str>) -> AuthResult<ResolvedIdentity> {
        let token = extract_bearer(header)?;
        self.authenticate(token).await
    }

    pub async fn authenticate(&self, token: &str) -> AuthResult<ResolvedIdentity> {
        self.authenticate_at(token, Utc::now()).await
    }

    pub async fn authenticate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<ResolvedIdentity> {
        let claims = self.tokens.verify_at(token, now).inspect_err(|e| {
            debug!(error = %e, "token rejected");
        })?;

        let Some(identity) = self.credentials.find_by_id(claims.sub).await? else {
            debug!(user_id = %claims.sub, "token subject no longer exists");
            return Err(AuthError::IdentityNotFound);
        };

        Ok(populate_roles(identity, self.roles.as_ref()).await?)
    }
}
