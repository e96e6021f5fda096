use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use thiserror::Error;

use super::models::Post;
use crate::uploads::{UploadStore, UploadStoreError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to remove image {filename}: {source}")]
    FileCleanup {
        filename: String,
        source: UploadStoreError,
    },
}

/// In-memory, insertion-ordered post catalog.
///
/// Cloning yields another handle to the same collection. Every operation
/// runs inside a single lock acquisition and never awaits while holding it.
#[derive(Clone, Default)]
pub struct Catalog {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    posts: Vec<Post>,
    /// Highest id handed out so far; ids are never reused.
    last_id: u64,
}

impl Inner {
    fn next_id(&mut self) -> String {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.last_id = now.max(self.last_id + 1);
        self.last_id.to_string()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a post, assigning an id when it has none. Returns the stored post.
    pub fn insert(&self, mut post: Post) -> Post {
        let mut inner = self.write();
        if post.id.is_empty() {
            post.id = inner.next_id();
        }
        inner.posts.push(post.clone());

        tracing::debug!(post_id = %post.id, sport = %post.sport, "Inserted post");
        post
    }

    pub fn get(&self, id: &str) -> Option<Post> {
        self.read().posts.iter().find(|p| p.id == id).cloned()
    }

    /// Posts whose sport equals `sport` ignoring case, in insertion order.
    pub fn filter_by_sport(&self, sport: &str) -> Vec<Post> {
        let wanted = sport.to_lowercase();
        self.read()
            .posts
            .iter()
            .filter(|p| p.sport.to_lowercase() == wanted)
            .cloned()
            .collect()
    }

    pub fn list_all(&self) -> Vec<Post> {
        self.read().posts.clone()
    }

    pub fn len(&self) -> usize {
        self.read().posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a post and its backing file from `uploads`.
    ///
    /// Returns `Ok(None)` if no post has this id. The lock is not held while
    /// the file is removed. If the file exists but cannot be removed the post
    /// stays in the catalog.
    pub async fn delete(
        &self,
        id: &str,
        uploads: &dyn UploadStore,
    ) -> Result<Option<Post>, CatalogError> {
        let Some(filename) = self.get(id).map(|p| p.filename) else {
            return Ok(None);
        };

        if let Some(filename) = filename {
            let removed = uploads.delete(&filename).await;
            removed.map_err(|source| CatalogError::FileCleanup { filename, source })?;
        }

        let mut inner = self.write();
        let Some(index) = inner.posts.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        let post = inner.posts.remove(index);
        tracing::debug!(post_id = %post.id, "Deleted post");
        Ok(Some(post))
    }
}
