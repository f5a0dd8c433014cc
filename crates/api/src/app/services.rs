//! Service wiring: stores, credential services, resolvers.
//!
//! Everything is constructed once here and shared through [`AppState`].

use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use tracing::info;

use warden_auth::{
    AccountService, CredentialStore, CredentialVerifier, DEFAULT_ROLE, IdentityResolver,
    PermissionResolver, RoleAssignmentResolver, RoleStore, TokenService,
};
use warden_infra::store::migrate;
use warden_infra::{
    InMemoryCredentialStore, InMemoryPostStore, InMemoryRoleStore, PostStore,
    PostgresCredentialStore, PostgresPostStore, PostgresRoleStore, ensure_role,
};

use crate::config::Config;

/// Shared per-process state handed to middleware and handlers.
pub struct AppState {
    pub accounts: AccountService,
    pub assignment: RoleAssignmentResolver,
    pub identities: IdentityResolver,
    pub permissions: PermissionResolver,
    pub roles: Arc<dyn RoleStore>,
    pub posts: Arc<dyn PostStore>,
}

struct Stores {
    credentials: Arc<dyn CredentialStore>,
    roles: Arc<dyn RoleStore>,
    posts: Arc<dyn PostStore>,
}

fn in_memory_stores() -> Stores {
    Stores {
        credentials: Arc::new(InMemoryCredentialStore::new()),
        roles: Arc::new(InMemoryRoleStore::new()),
        posts: Arc::new(InMemoryPostStore::new()),
    }
}

async fn postgres_stores(database_url: &str) -> anyhow::Result<Stores> {
    let pool = PgPool::connect(database_url)
        .await
        .context("failed to connect to Postgres")?;
    migrate(&pool).await.context("failed to apply schema")?;

    Ok(Stores {
        credentials: Arc::new(PostgresCredentialStore::new(pool.clone())),
        roles: Arc::new(PostgresRoleStore::new(pool.clone())),
        posts: Arc::new(PostgresPostStore::new(pool)),
    })
}

pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let stores = match config.database_url.as_deref() {
        Some(url) => {
            info!("using postgres stores");
            postgres_stores(url).await?
        }
        None => {
            info!("using in-memory stores");
            in_memory_stores()
        }
    };

    ensure_role(stores.roles.as_ref(), DEFAULT_ROLE, Vec::new())
        .await
        .context("failed to seed default role")?;

    let tokens = Arc::new(TokenService::new(config.jwt_secret.as_bytes()).with_ttl(config.token_ttl));
    let verifier = CredentialVerifier::new(config.bcrypt_cost);

    Ok(AppState {
        accounts: AccountService::new(stores.credentials.clone(), verifier, tokens.clone()),
        assignment: RoleAssignmentResolver::new(stores.roles.clone()),
        identities: IdentityResolver::new(tokens, stores.credentials, stores.roles.clone()),
        permissions: PermissionResolver::new(config.matching),
        roles: stores.roles,
        posts: stores.posts,
    })
}
