//! Infrastructure layer: credential, role and post storage plus seeding.

pub mod posts;
pub mod seed;
pub mod store;


pub use posts::{NewPost, Post, PostStore, PostUpdate};
pub use seed::ensure_role;
pub use store::{
    InMemoryCredentialStore, InMemoryPostStore, InMemoryRoleStore, PostgresCredentialStore,
    PostgresPostStore, PostgresRoleStore,
};
