use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use warden_auth::{
    CredentialStore, Identity, IdentityFilter, Role, RoleFilter, RoleStore, StoreError,
};
use warden_core::{PostId, RoleId, UserId};

use crate::posts::{Post, PostStore};

/// Map behind a lock, shared by the in-memory stores.
#[derive(Debug)]
struct Table<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Table<K, V> {
    fn read(&self) -> RwLockReadGuard<'_, HashMap<K, V>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, V>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Credentials
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory credential store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: Table<UserId, Identity>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn ensure_unique_identity(
    map: &HashMap<UserId, Identity>,
    candidate: &Identity,
) -> Result<(), StoreError> {
    for other in map.values().filter(|o| o.id != candidate.id) {
        if other.email == candidate.email {
            return Err(StoreError::conflict("email already exists"));
        }
        if other.username == candidate.username {
            return Err(StoreError::conflict("username already exists"));
        }
    }
    Ok(())
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn find_by_filter(&self, filter: &IdentityFilter) -> Result<Vec<Identity>, StoreError> {
        let mut found: Vec<Identity> = self
            .users
            .read()
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();
        found.sort_by_key(|i| i.id);
        Ok(found)
    }

    async fn create(&self, identity: Identity) -> Result<Identity, StoreError> {
        let mut map = self.users.write();
        if map.contains_key(&identity.id) {
            return Err(StoreError::conflict("id already exists"));
        }
        ensure_unique_identity(&map, &identity)?;
        map.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn update_by_id(&self, id: UserId, mut identity: Identity) -> Result<Identity, StoreError> {
        identity.id = id;
        let mut map = self.users.write();
        if !map.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        ensure_unique_identity(&map, &identity)?;
        map.insert(id, identity.clone());
        Ok(identity)
    }

    async fn delete_by_id(&self, id: UserId) -> Result<bool, StoreError> {
        Ok(self.users.write().remove(&id).is_some())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Roles
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory role store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    roles: Table<RoleId, Role>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn ensure_unique_role(map: &HashMap<RoleId, Role>, candidate: &Role) -> Result<(), StoreError> {
    if map
        .values()
        .any(|r| r.id != candidate.id && r.name == candidate.name)
    {
        return Err(StoreError::conflict(format!(
            "role '{}' already exists",
            candidate.name
        )));
    }
    Ok(())
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn find_by_id(&self, id: RoleId) -> Result<Option<Role>, StoreError> {
        Ok(self.roles.read().get(&id).cloned())
    }

    async fn find_by_filter(&self, filter: &RoleFilter) -> Result<Vec<Role>, StoreError> {
        let mut found: Vec<Role> = self
            .roles
            .read()
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn create(&self, role: Role) -> Result<Role, StoreError> {
        let mut map = self.roles.write();
        if map.contains_key(&role.id) {
            return Err(StoreError::conflict("id already exists"));
        }
        ensure_unique_role(&map, &role)?;
        map.insert(role.id, role.clone());
        Ok(role)
    }

    async fn update_by_id(&self, id: RoleId, mut role: Role) -> Result<Role, StoreError> {
        role.id = id;
        let mut map = self.roles.write();
        if !map.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        ensure_unique_role(&map, &role)?;
        map.insert(id, role.clone());
        Ok(role)
    }

    async fn delete_by_id(&self, id: RoleId) -> Result<bool, StoreError> {
        Ok(self.roles.write().remove(&id).is_some())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Posts
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryPostStore {
    posts: Table<PostId, Post>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        Ok(self.posts.read().get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        let mut all: Vec<Post> = self.posts.read().values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn create(&self, post: Post) -> Result<Post, StoreError> {
        let mut map = self.posts.write();
        if map.contains_key(&post.id) {
            return Err(StoreError::conflict("id already exists"));
        }
        map.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update_by_id(&self, id: PostId, mut post: Post) -> Result<Post, StoreError> {
        post.id = id;
        let mut map = self.posts.write();
        match map.get_mut(&id) {
            Some(slot) => {
                *slot = post.clone();
                Ok(post)
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_by_id(&self, id: PostId) -> Result<bool, StoreError> {
        Ok(self.posts.write().remove(&id).is_some())
    }
}
