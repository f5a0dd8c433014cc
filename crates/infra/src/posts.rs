//! Posts: the plain CRUD resource guarded by `posts_*` permissions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_auth::StoreError;
use warden_core::{DomainResult, PostId, UserId, require_non_blank};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl Post {
    pub fn create(author_id: UserId, new: NewPost, now: DateTime<Utc>) -> DomainResult<Self> {
        require_non_blank("title", &new.title)?;
        Ok(Self {
            id: PostId::new(),
            author_id,
            title: new.title,
            body: new.body,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, update: PostUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(title) = update.title {
            require_non_blank("title", &title)?;
            self.title = title;
        }
        if let Some(body) = update.body {
            self.body = body;
        }
        self.updated_at = now;
        Ok(())
    }
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, StoreError>;

    /// All posts, oldest first.
    async fn list(&self) -> Result<Vec<Post>, StoreError>;

    async fn create(&self, post: Post) -> Result<Post, StoreError>;

    async fn update_by_id(&self, id: PostId, post: Post) -> Result<Post, StoreError>;

    async fn delete_by_id(&self, id: PostId) -> Result<bool, StoreError>;
}
