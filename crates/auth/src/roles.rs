use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use warden_core::RoleId;

use crate::Permission;

/// Name of the role assigned when a registration names none.
pub const DEFAULT_ROLE: &str = "user";

/// Role name used for RBAC lookups. Case-sensitive, unique per role store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(Cow<'static, str>);

impl RoleName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn default_role() -> Self {
        Self::new(DEFAULT_ROLE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named bundle of permission strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>, permissions: Vec<Permission>) -> Self {
        Self {
            id: RoleId::new(),
            name: RoleName::new(name),
            permissions,
        }
    }
}
