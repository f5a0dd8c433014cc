//! Role assignment for identity creation: role names → role ids.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use warden_core::RoleId;

use crate::store::{RoleFilter, RoleStore};
use crate::{AuthError, AuthResult, RoleName};

/// Role names requested by a creation body's `roles` field.
///
/// Absent, non-array, or empty → `["user"]`. Non-string elements are
/// ignored; an array holding none also falls back to the default.
pub fn requested_role_names(body: &Value) -> Vec<RoleName> {
    let names: Vec<RoleName> = body
        .get("roles")
        .and_then(Value::as_array)
        .map(|roles| {
            roles
                .iter()
                .filter_map(Value::as_str)
                .map(|name| RoleName::new(name.to_owned()))
                .collect()
        })
        .unwrap_or_default();

    if names.is_empty() {
        vec![RoleName::default_role()]
    } else {
        names
    }
}

/// Resolves requested role names to role ids before an identity is created.
#[derive(Clone)]
pub struct RoleAssignmentResolver {
    roles: Arc<dyn RoleStore>,
}

impl RoleAssignmentResolver {
    pub fn new(roles: Arc<dyn RoleStore>) -> Self {
        Self { roles }
    }

    /// Ids of every role whose name is in `requested` (the default role when
    /// `requested` is empty). Names with no role are skipped; only a lookup
    /// that matches nothing fails.
    pub async fn resolve_roles(&self, requested: &[RoleName]) -> AuthResult<Vec<RoleId>> {
        let requested = if requested.is_empty() {
            vec![RoleName::default_role()]
        } else {
            requested.to_vec()
        };

        let found = self
            .roles
            .find_by_filter(&RoleFilter::NameIn(requested.clone()))
            .await?;

        if found.is_empty() {
            debug!(?requested, "no requested role exists");
            return Err(AuthError::NoMatchingRoles);
        }

        Ok(found.into_iter().map(|r| r.id).collect())
    }

    /// Rewrite a creation body in place: `roles` becomes the resolved ids.
    pub async fn resolve_body(&self, body: &mut Value) -> AuthResult<Vec<RoleId>> {
        let ids = self.resolve_roles(&requested_role_names(body)).await?;

        if let Some(object) = body.as_object_mut() {
            let encoded = ids.iter().map(|id| Value::String(id.to_string())).collect();
            object.insert("roles".to_owned(), Value::Array(encoded));
        }
        Ok(ids)
    }
}
