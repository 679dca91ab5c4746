//! In-memory storage backend.
//!
//! Used by tests and by embedders that persist elsewhere.

use std::collections::HashMap;
use async_trait::async_trait;
use lessonpath_core::{CompletionRecord, CourseId, CourseTree, LearnerContext};
use tokio::sync::RwLock;
use tracing::debug;

use super::trait_::{next_version, CompletionStore, ContentTreeProvider, Result, Versioned};

/// Storage backend holding trees and records in memory.
#[derive(Default)]
pub struct MemoryStore {
    trees: RwLock<HashMap<CourseId, CourseTree>>,
    records: RwLock<HashMap<LearnerContext, Versioned<CompletionRecord>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a course tree.
    pub async fn put_course_tree(&self, tree: CourseTree) {
        self.trees.write().await.insert(tree.course.id, tree);
    }

    /// Number of stored records.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl ContentTreeProvider for MemoryStore {
    async fn get_course_tree(&self, course_id: CourseId) -> Result<Option<CourseTree>> {
        Ok(self.trees.read().await.get(&course_id).cloned())
    }
}

#[async_trait]
impl CompletionStore for MemoryStore {
    async fn get_record(&self, context: LearnerContext) -> Result<Option<Versioned<CompletionRecord>>> {
        Ok(self.records.read().await.get(&context).cloned())
    }

    async fn put_record(&self, record: &CompletionRecord, expected_version: Option<u64>) -> Result<u64> {
        let context = record.context();
        let mut records = self.records.write().await;
        let found = records.get(&context).map(|r| r.version);
        let version = next_version(expected_version, found)?;
        records.insert(context, Versioned { version, value: record.clone() });
        debug!(%context, version, "stored completion record");
        Ok(version)
    }

    async fn delete_record(&self, context: LearnerContext) -> Result<()> {
        self.records.write().await.remove(&context);
        Ok(())
    }
}
