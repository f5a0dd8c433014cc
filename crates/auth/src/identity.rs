//! Identity records as held by the credential store.

use serde::{Deserialize, Serialize};

use warden_core::{RoleId, UserId};

use crate::{Permission, Role};

/// Salted password digest. Redacted in `Debug`, never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Wrap a digest loaded from storage or produced by the verifier.
    pub fn from_stored(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordDigest(<redacted>)")
    }
}

/// A user account.
///
/// `roles` holds identifiers only; use [`crate::store::populate_roles`] to
/// load the records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_digest: PasswordDigest,
    pub permissions: Vec<Permission>,
    pub roles: Vec<RoleId>,
}

/// Registration input. Holds the plaintext password until it is hashed.
#[derive(Clone, Deserialize)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

impl core::fmt::Debug for NewIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewIdentity")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("permissions", &self.permissions)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

/// Partial profile update. `None` leaves a field untouched.
#[derive(Clone, Default, Deserialize)]
pub struct IdentityUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub permissions: Option<Vec<Permission>>,
    pub roles: Option<Vec<RoleId>>,
}

impl core::fmt::Debug for IdentityUpdate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdentityUpdate")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_changed", &self.password.is_some())
            .field("permissions", &self.permissions)
            .field("roles", &self.roles)
            .finish()
    }
}

/// An identity with its role references joined to role records.
///
/// Role ids that no longer resolve are absent from `roles`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub identity: Identity,
    pub roles: Vec<Role>,
}

/// Outward shape of a resolved identity: role records replace role ids.
#[derive(Serialize)]
struct ResolvedIdentityView<'a> {
    id: UserId,
    username: &'a str,
    email: &'a str,
    permissions: &'a [Permission],
    roles: &'a [Role],
}

impl Serialize for ResolvedIdentity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ResolvedIdentityView {
            id: self.identity.id,
            username: &self.identity.username,
            email: &self.identity.email,
            permissions: &self.identity.permissions,
            roles: &self.roles,
        }
        .serialize(serializer)
    }
}

impl ResolvedIdentity {
    pub fn id(&self) -> UserId {
        self.identity.id
    }
}
