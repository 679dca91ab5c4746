//! Caching decorator for content tree providers.
//!
//! Course structure changes rarely compared to learner progress, so trees are
//! kept for a fixed time-to-live before being fetched again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use async_trait::async_trait;
use lessonpath_core::{CourseId, CourseTree};
use tokio::sync::RwLock;
use tracing::debug;

use super::trait_::{ContentTreeProvider, Result};

/// Wraps a [`ContentTreeProvider`] with a per-course TTL cache.
pub struct CachedTreeProvider<P> {
    inner: Arc<P>,
    ttl: Duration,
    entries: RwLock<HashMap<CourseId, (Instant, CourseTree)>>,
}

impl<P: ContentTreeProvider> CachedTreeProvider<P> {
    /// Create a cache in front of `inner`.
    pub fn new(inner: Arc<P>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &Arc<P> {
        &self.inner
    }

    /// Drop the cached tree of a course, e.g. after an authoring change.
    pub async fn invalidate(&self, course_id: CourseId) {
        self.entries.write().await.remove(&course_id);
    }

    /// Drop every cached tree.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl<P: ContentTreeProvider> ContentTreeProvider for CachedTreeProvider<P> {
    async fn get_course_tree(&self, course_id: CourseId) -> Result<Option<CourseTree>> {
        if let Some((fetched_at, tree)) = self.entries.read().await.get(&course_id) {
            if fetched_at.elapsed() < self.ttl {
                return Ok(Some(tree.clone()));
            }
        }

        debug!(%course_id, "course tree cache miss");
        let tree = self.inner.get_course_tree(course_id).await?;
        if let Some(tree) = &tree {
            self.entries
                .write()
                .await
                .insert(course_id, (Instant::now(), tree.clone()));
        }
        Ok(tree)
    }
}
