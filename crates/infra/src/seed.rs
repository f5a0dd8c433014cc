//! Startup seeding of roles the service depends on.

use tracing::info;

use warden_auth::{Permission, Role, RoleFilter, RoleName, RoleStore, StoreError};

/// Return the role named `name`, creating it with `permissions` if absent.
///
/// An existing role is returned untouched. A concurrent creation of the same
/// name resolves to whichever record won.
pub async fn ensure_role(
    store: &dyn RoleStore,
    name: &'static str,
    permissions: Vec<Permission>,
) -> Result<Role, StoreError> {
    let filter = RoleFilter::NameIn(vec![RoleName::new(name)]);

    if let Some(existing) = store.find_by_filter(&filter).await?.into_iter().next() {
        return Ok(existing);
    }

    match store.create(Role::new(name, permissions)).await {
        Ok(role) => {
            info!(role = name, role_id = %role.id, "seeded role");
            Ok(role)
        }
        Err(StoreError::Conflict(_)) => store
            .find_by_filter(&filter)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound),
        Err(e) => Err(e),
    }
}
