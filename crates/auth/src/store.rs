//! Storage contracts the authorization core reads through.
//!
//! Implementations live in `warden-infra`. The core imposes no timeout or
//! retry policy of its own on these calls.

use async_trait::async_trait;

use warden_core::{RoleId, UserId};

use crate::{Identity, ResolvedIdentity, Role, RoleName, StoreError};

/// Unique-field lookups on identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityFilter {
    All,
    Email(String),
    Username(String),
}

/// Role lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleFilter {
    All,
    NameIn(Vec<RoleName>),
    IdIn(Vec<RoleId>),
}

impl RoleFilter {
    pub fn matches(&self, role: &Role) -> bool {
        match self {
            RoleFilter::All => true,
            RoleFilter::NameIn(names) => names.contains(&role.name),
            RoleFilter::IdIn(ids) => ids.contains(&role.id),
        }
    }
}

impl IdentityFilter {
    pub fn matches(&self, identity: &Identity) -> bool {
        match self {
            IdentityFilter::All => true,
            IdentityFilter::Email(email) => identity.email == *email,
            IdentityFilter::Username(username) => identity.username == *username,
        }
    }
}

/// Exclusive owner of identity records.
///
/// Email and username are unique; violations are `StoreError::Conflict`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError>;

    async fn find_by_filter(&self, filter: &IdentityFilter) -> Result<Vec<Identity>, StoreError>;

    async fn create(&self, identity: Identity) -> Result<Identity, StoreError>;

    /// Replace the stored record. `StoreError::NotFound` if `id` is absent.
    async fn update_by_id(&self, id: UserId, identity: Identity) -> Result<Identity, StoreError>;

    /// Returns whether a record was removed.
    async fn delete_by_id(&self, id: UserId) -> Result<bool, StoreError>;
}

/// Owner of role records. Role names are unique.
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn find_by_id(&self, id: RoleId) -> Result<Option<Role>, StoreError>;

    async fn find_by_filter(&self, filter: &RoleFilter) -> Result<Vec<Role>, StoreError>;

    async fn create(&self, role: Role) -> Result<Role, StoreError>;

    async fn update_by_id(&self, id: RoleId, role: Role) -> Result<Role, StoreError>;

    /// Deleting a role leaves identities referencing it untouched; those
    /// references simply stop resolving.
    async fn delete_by_id(&self, id: RoleId) -> Result<bool, StoreError>;
}

/// Join an identity's role ids to role records.
///
/// Order follows `identity.roles`; ids with no record are dropped.
pub async fn populate_roles(
    identity: Identity,
    roles: &dyn RoleStore,
) -> Result<ResolvedIdentity, StoreError> {
    if identity.roles.is_empty() {
        return Ok(ResolvedIdentity {
            identity,
            roles: Vec::new(),
        });
    }

    let found = roles
        .find_by_filter(&RoleFilter::IdIn(identity.roles.clone()))
        .await?;

    let mut resolved: Vec<Role> = Vec::with_capacity(found.len());
    for id in &identity.roles {
        if resolved.iter().any(|r| r.id == *id) {
            continue;
        }
        if let Some(role) = found.iter().find(|r| r.id == *id) {
            resolved.push(role.clone());
        }
    }

    Ok(ResolvedIdentity {
        identity,
        roles: resolved,
    })
}
