//! Account lifecycle: registration, login, profile update, removal.
//!
//! Password hashing is an explicit stage that always runs before the store
//! write; the plaintext never reaches the store.

use std::sync::Arc;

use tracing::{debug, info};

use warden_core::{DomainError, UserId, require_non_blank};

use crate::store::{CredentialStore, IdentityFilter};
use crate::{
    AuthError, AuthResult, CredentialVerifier, Identity, IdentityUpdate, NewIdentity, StoreError,
    TokenService,
};

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub identity: Identity,
}

/// Identity CRUD with credential handling.
#[derive(Clone)]
pub struct AccountService {
    credentials: Arc<dyn CredentialStore>,
    verifier: CredentialVerifier,
    tokens: Arc<TokenService>,
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    require_non_blank("email", email)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DomainError::validation("email must contain '@'")),
    }
}

impl AccountService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        verifier: CredentialVerifier,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            credentials,
            verifier,
            tokens,
        }
    }

    async fn email_owner(&self, email: &str) -> AuthResult<Option<UserId>> {
        let found = self
            .credentials
            .find_by_filter(&IdentityFilter::Email(email.to_owned()))
            .await?;
        Ok(found.first().map(|i| i.id))
    }

    /// Create an identity. `new.roles` must already hold resolved role ids.
    pub async fn register(&self, new: NewIdentity) -> AuthResult<Identity> {
        require_non_blank("username", &new.username)?;
        validate_email(&new.email)?;
        require_non_blank("password", &new.password)?;

        if self.email_owner(&new.email).await?.is_some() {
            return Err(AuthError::EmailInUse);
        }

        let password_digest = self.verifier.hash(&new.password)?;
        let identity = Identity {
            id: UserId::new(),
            username: new.username,
            email: new.email,
            password_digest,
            permissions: new.permissions,
            roles: new.roles,
        };

        let created = self.credentials.create(identity).await?;
        info!(user_id = %created.id, "identity registered");
        Ok(created)
    }

    /// Exchange email + password for a token.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<LoginOutcome> {
        let found = self
            .credentials
            .find_by_filter(&IdentityFilter::Email(email.to_owned()))
            .await?;

        let Some(identity) = found.into_iter().next() else {
            debug!("login for unknown email");
            return Err(AuthError::CredentialInvalid);
        };

        if !self.verifier.verify(password, &identity.password_digest)? {
            debug!(user_id = %identity.id, "login with wrong password");
            return Err(AuthError::CredentialInvalid);
        }

        let token = self.tokens.issue(&identity)?;
        info!(user_id = %identity.id, "login succeeded");
        Ok(LoginOutcome { token, identity })
    }

    /// A missing record is `StoreError::NotFound`; `IdentityNotFound` is
    /// reserved for token subjects that no longer exist.
    pub async fn get(&self, id: UserId) -> AuthResult<Identity> {
        self.credentials
            .find_by_id(id)
            .await?
            .ok_or(AuthError::Store(StoreError::NotFound))
    }

    pub async fn list(&self) -> AuthResult<Vec<Identity>> {
        Ok(self.credentials.find_by_filter(&IdentityFilter::All).await?)
    }

    /// Apply a partial update. The digest is recomputed only when a new
    /// password is supplied.
    pub async fn update(&self, id: UserId, update: IdentityUpdate) -> AuthResult<Identity> {
        let mut identity = self.get(id).await?;

        if let Some(username) = update.username {
            require_non_blank("username", &username)?;
            identity.username = username;
        }
        if let Some(email) = update.email {
            validate_email(&email)?;
            if self.email_owner(&email).await?.is_some_and(|owner| owner != id) {
                return Err(AuthError::EmailInUse);
            }
            identity.email = email;
        }
        if let Some(password) = update.password {
            require_non_blank("password", &password)?;
            identity.password_digest = self.verifier.hash(&password)?;
        }
        if let Some(permissions) = update.permissions {
            identity.permissions = permissions;
        }
        if let Some(roles) = update.roles {
            identity.roles = roles;
        }

        Ok(self.credentials.update_by_id(id, identity).await?)
    }

    pub async fn delete(&self, id: UserId) -> AuthResult<()> {
        if self.credentials.delete_by_id(id).await? {
            info!(user_id = %id, "identity deleted");
            Ok(())
        } else {
            Err(StoreError::NotFound.into())
        }
    }
}
