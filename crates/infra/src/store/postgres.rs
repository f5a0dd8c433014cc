//! Postgres-backed stores.
//!
//! ## Error Mapping
//!
//! | SQLx error | Postgres code | `StoreError` |
//! |------------|---------------|--------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | any | `Backend` |
//! | Pool / IO / decode | n/a | `Backend` |
//!
//! Every store is `Send + Sync`; the pool handles connection sharing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{error, instrument};
use uuid::Uuid;

use warden_auth::{
    CredentialStore, Identity, IdentityFilter, PasswordDigest, Permission, Role, RoleFilter,
    RoleName, RoleStore, StoreError,
};
use warden_core::{PostId, RoleId, UserId};

use crate::posts::{Post, PostStore};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

/// Create tables if they do not exist. Idempotent.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("migrate", e))?;
    Ok(())
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code() {
                Some(code) if code.as_ref() == "23505" => StoreError::Conflict(msg),
                _ => {
                    error!(operation, "{msg}");
                    StoreError::Backend(msg)
                }
            }
        }
        other => {
            error!(operation, error = %other, "store operation failed");
            StoreError::Backend(format!("{operation}: {other}"))
        }
    }
}

fn decode_err(operation: &str) -> impl Fn(sqlx::Error) -> StoreError + '_ {
    move |e| StoreError::Backend(format!("failed to decode row in {operation}: {e}"))
}

fn to_strings(permissions: &[Permission]) -> Vec<String> {
    permissions.iter().map(|p| p.as_str().to_owned()).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Credentials
// ─────────────────────────────────────────────────────────────────────────────

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn identity_from_row(row: &PgRow) -> Result<Identity, sqlx::Error> {
    let permissions: Vec<String> = row.try_get("permissions")?;
    let roles: Vec<Uuid> = row.try_get("roles")?;
    Ok(Identity {
        id: UserId::from_uuid(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_digest: PasswordDigest::from_stored(row.try_get::<String, _>("password_digest")?),
        permissions: permissions.into_iter().map(Permission::from).collect(),
        roles: roles.into_iter().map(RoleId::from_uuid).collect(),
    })
}

fn role_uuids(identity: &Identity) -> Vec<Uuid> {
    identity.roles.iter().map(|r| *r.as_uuid()).collect()
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query("SELECT id, username, email, password_digest, permissions, roles FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_id", e))?;

        row.as_ref()
            .map(identity_from_row)
            .transpose()
            .map_err(decode_err("find_user_by_id"))
    }

    #[instrument(skip(self, filter))]
    async fn find_by_filter(&self, filter: &IdentityFilter) -> Result<Vec<Identity>, StoreError> {
        let query = match filter {
            IdentityFilter::All => {
                sqlx::query("SELECT id, username, email, password_digest, permissions, roles FROM users ORDER BY id")
            }
            IdentityFilter::Email(email) => {
                sqlx::query("SELECT id, username, email, password_digest, permissions, roles FROM users WHERE email = $1")
                    .bind(email.clone())
            }
            IdentityFilter::Username(username) => {
                sqlx::query("SELECT id, username, email, password_digest, permissions, roles FROM users WHERE username = $1")
                    .bind(username.clone())
            }
        };

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_users", e))?;

        rows.iter()
            .map(identity_from_row)
            .collect::<Result<_, _>>()
            .map_err(decode_err("find_users"))
    }

    #[instrument(skip(self, identity), fields(user_id = %identity.id))]
    async fn create(&self, identity: Identity) -> Result<Identity, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_digest, permissions, roles)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(identity.id.as_uuid())
        .bind(&identity.username)
        .bind(&identity.email)
        .bind(identity.password_digest.as_str())
        .bind(to_strings(&identity.permissions))
        .bind(role_uuids(&identity))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;

        Ok(identity)
    }

    #[instrument(skip(self, identity))]
    async fn update_by_id(&self, id: UserId, mut identity: Identity) -> Result<Identity, StoreError> {
        identity.id = id;
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, password_digest = $4, permissions = $5, roles = $6
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(&identity.username)
        .bind(&identity.email)
        .bind(identity.password_digest.as_str())
        .bind(to_strings(&identity.permissions))
        .bind(role_uuids(&identity))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(identity)
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(result.rows_affected() > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Roles
// ─────────────────────────────────────────────────────────────────────────────

pub struct PostgresRoleStore {
    pool: PgPool,
}

impl PostgresRoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn role_from_row(row: &PgRow) -> Result<Role, sqlx::Error> {
    let permissions: Vec<String> = row.try_get("permissions")?;
    Ok(Role {
        id: RoleId::from_uuid(row.try_get("id")?),
        name: RoleName::new(row.try_get::<String, _>("name")?),
        permissions: permissions.into_iter().map(Permission::from).collect(),
    })
}

#[async_trait]
impl RoleStore for PostgresRoleStore {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: RoleId) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query("SELECT id, name, permissions FROM roles WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_role_by_id", e))?;

        row.as_ref()
            .map(role_from_row)
            .transpose()
            .map_err(decode_err("find_role_by_id"))
    }

    #[instrument(skip(self, filter))]
    async fn find_by_filter(&self, filter: &RoleFilter) -> Result<Vec<Role>, StoreError> {
        let query = match filter {
            RoleFilter::All => sqlx::query("SELECT id, name, permissions FROM roles ORDER BY name"),
            RoleFilter::NameIn(names) => sqlx::query(
                "SELECT id, name, permissions FROM roles WHERE name = ANY($1) ORDER BY name",
            )
            .bind(names.iter().map(|n| n.as_str().to_owned()).collect::<Vec<_>>()),
            RoleFilter::IdIn(ids) => sqlx::query(
                "SELECT id, name, permissions FROM roles WHERE id = ANY($1) ORDER BY name",
            )
            .bind(ids.iter().map(|id| *id.as_uuid()).collect::<Vec<_>>()),
        };

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_roles", e))?;

        rows.iter()
            .map(role_from_row)
            .collect::<Result<_, _>>()
            .map_err(decode_err("find_roles"))
    }

    #[instrument(skip(self, role), fields(role = %role.name))]
    async fn create(&self, role: Role) -> Result<Role, StoreError> {
        sqlx::query("INSERT INTO roles (id, name, permissions) VALUES ($1, $2, $3)")
            .bind(role.id.as_uuid())
            .bind(role.name.as_str())
            .bind(to_strings(&role.permissions))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_role", e))?;
        Ok(role)
    }

    #[instrument(skip(self, role))]
    async fn update_by_id(&self, id: RoleId, mut role: Role) -> Result<Role, StoreError> {
        role.id = id;
        let result = sqlx::query("UPDATE roles SET name = $2, permissions = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(role.name.as_str())
            .bind(to_strings(&role.permissions))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_role", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(role)
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: RoleId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_role", e))?;
        Ok(result.rows_affected() > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Posts
// ─────────────────────────────────────────────────────────────────────────────

pub struct PostgresPostStore {
    pool: PgPool,
}

impl PostgresPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn post_from_row(row: &PgRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: PostId::from_uuid(row.try_get("id")?),
        author_id: UserId::from_uuid(row.try_get("author_id")?),
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

#[async_trait]
impl PostStore for PostgresPostStore {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        let row = sqlx::query("SELECT id, author_id, title, body, created_at, updated_at FROM posts WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_post_by_id", e))?;

        row.as_ref()
            .map(post_from_row)
            .transpose()
            .map_err(decode_err("find_post_by_id"))
    }

    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, author_id, title, body, created_at, updated_at FROM posts ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_posts", e))?;

        rows.iter()
            .map(post_from_row)
            .collect::<Result<_, _>>()
            .map_err(decode_err("list_posts"))
    }

    async fn create(&self, post: Post) -> Result<Post, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, title, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(post.id.as_uuid())
        .bind(post.author_id.as_uuid())
        .bind(&post.title)
        .bind(&post.body)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_post", e))?;
        Ok(post)
    }

    async fn update_by_id(&self, id: PostId, mut post: Post) -> Result<Post, StoreError> {
        post.id = id;
        let result =
            sqlx::query("UPDATE posts SET title = $2, body = $3, updated_at = $4 WHERE id = $1")
                .bind(id.as_uuid())
                .bind(&post.title)
                .bind(&post.body)
                .bind(post.updated_at)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("update_post", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(post)
    }

    async fn delete_by_id(&self, id: PostId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_post", e))?;
        Ok(result.rows_affected() > 0)
    }
}
