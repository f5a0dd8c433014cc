//! Permission resolution: `{method, path}` + identity → allow or deny.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::requirements::{Method, RequirementTable};
use crate::{AuthError, AuthResult, Permission, ResolvedIdentity};

/// How the requirement cache takes part in a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingMode {
    /// Allow if the identity holds *any* permission ever required under the
    /// request's method, not only the one computed for this path.
    #[default]
    Accumulated,
    /// Allow only if the identity holds `{module}_{scope}` for this path.
    Strict,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown permission matching mode '{0}' (expected 'accumulated' or 'strict')")]
pub struct UnknownMatchingMode(pub String);

impl FromStr for MatchingMode {
    type Err = UnknownMatchingMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accumulated" => Ok(MatchingMode::Accumulated),
            "strict" => Ok(MatchingMode::Strict),
            other => Err(UnknownMatchingMode(other.to_string())),
        }
    }
}

/// Where an identity's effective permissions came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionSource {
    Direct,
    Roles,
}

/// The permission strings usable by an identity for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePermissions {
    pub source: PermissionSource,
    pub permissions: HashSet<Permission>,
}

/// Direct grants, when there are any, replace role grants entirely;
/// otherwise the union of every resolved role's permissions applies.
pub fn effective_permissions(identity: &ResolvedIdentity) -> EffectivePermissions {
    if !identity.identity.permissions.is_empty() {
        return EffectivePermissions {
            source: PermissionSource::Direct,
            permissions: identity.identity.permissions.iter().cloned().collect(),
        };
    }

    EffectivePermissions {
        source: PermissionSource::Roles,
        permissions: identity
            .roles
            .iter()
            .flat_map(|r| r.permissions.iter().cloned())
            .collect(),
    }
}

/// First segment of a request path (`/users/123` → `users`).
///
/// Query strings and fragments are ignored. `None` for the root path.
pub fn module_from_path(path: &str) -> Option<&str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').find(|s| !s.is_empty())
}

/// Outcome of a granted authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// `{module}_{scope}` for the request.
    pub required: Permission,
    /// The permission in the effective set that satisfied the check.
    pub matched: Permission,
    pub source: PermissionSource,
}

/// Decides whether an authenticated identity may perform a request.
///
/// Owns the requirement table; construct once and share.
#[derive(Debug, Default)]
pub struct PermissionResolver {
    table: RequirementTable,
    mode: MatchingMode,
}

impl PermissionResolver {
    pub fn new(mode: MatchingMode) -> Self {
        Self {
            table: RequirementTable::new(),
            mode,
        }
    }

    pub fn table(&self) -> &RequirementTable {
        &self.table
    }

    /// The permission string a request requires, without deciding anything.
    pub fn required_permission(&self, method: Method, path: &str) -> Option<Permission> {
        let module = module_from_path(path)?;
        Some(Permission::required(module, self.table.scope(method)))
    }

    pub fn authorize(
        &self,
        identity: &ResolvedIdentity,
        method: Method,
        path: &str,
    ) -> AuthResult<Decision> {
        let Some(required) = self.required_permission(method, path) else {
            info!(user_id = %identity.id(), %method, "request has no resource module; denied");
            return Err(AuthError::PermissionDenied(String::new()));
        };

        self.table.register(method, &required);

        let effective = effective_permissions(identity);

        let matched = if effective.permissions.contains(&required) {
            Some(required.clone())
        } else if self.mode == MatchingMode::Accumulated {
            self.table.first_registered_in(method, &effective.permissions)
        } else {
            None
        };

        match matched {
            Some(matched) => {
                if matched != required {
                    debug!(
                        user_id = %identity.id(),
                        %required,
                        %matched,
                        "granted through a permission registered by another module"
                    );
                }
                Ok(Decision {
                    required,
                    matched,
                    source: effective.source,
                })
            }
            None => {
                info!(user_id = %identity.id(), %method, %required, "permission denied");
                Err(AuthError::PermissionDenied(required.to_string()))
            }
        }
    }
}
