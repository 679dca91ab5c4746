//! JSON file storage implementation.
//!
//! Stores course trees and completion records as JSON files under a root
//! directory. Each record file carries its own version (and updated_at) used
//! for compare-and-swap writes, and every file is replaced through a temp file
//! and a rename so readers never observe a partial write.

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lessonpath_core::{CompletionRecord, CourseId, CourseTree, LearnerContext};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use super::trait_::{next_version, CompletionStore, ContentTreeProvider, Result, Versioned};

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStorage {
    /// Create storage rooted at `root`, creating the directory layout.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("courses")).await?;
        fs::create_dir_all(root.join("records")).await?;

        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn course_path(&self, id: CourseId) -> PathBuf {
        self.root.join("courses").join(format!("{}.json", id))
    }

    fn record_path(&self, context: LearnerContext) -> PathBuf {
        self.root
            .join("records")
            .join(context.course_id.to_string())
            .join(format!("{}.json", context.learner_id))
    }

    /// Write a course tree, replacing any previous version.
    pub async fn save_course_tree(&self, tree: &CourseTree) -> Result<()> {
        let json = serde_json::to_string_pretty(tree)?;
        let _guard = self.write_lock.lock().await;
        write_atomic(&self.course_path(tree.course.id), json.as_bytes()).await?;
        debug!(course_id = %tree.course.id, "saved course tree");
        Ok(())
    }

    /// List IDs of all stored course trees.
    pub async fn list_courses(&self) -> Result<Vec<CourseId>> {
        let mut ids = Vec::new();
        let mut rd = fs::read_dir(self.root.join("courses")).await?;
        while let Some(entry) = rd.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path.file_stem().and_then(|s| s.to_str()).and_then(|s| s.parse().ok()) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl ContentTreeProvider for JsonStorage {
    async fn get_course_tree(&self, course_id: CourseId) -> Result<Option<CourseTree>> {
        read_json(&self.course_path(course_id)).await
    }
}

#[async_trait]
impl CompletionStore for JsonStorage {
    async fn get_record(&self, context: LearnerContext) -> Result<Option<Versioned<CompletionRecord>>> {
        let stored: Option<StoredRecord<CompletionRecord>> = read_json(&self.record_path(context)).await?;
        Ok(stored.map(|s| Versioned { version: s.version, value: s.record }))
    }

    async fn put_record(&self, record: &CompletionRecord, expected_version: Option<u64>) -> Result<u64> {
        let context = record.context();
        let record_path = self.record_path(context);
        let _guard = self.write_lock.lock().await;

        let found: Option<StoredRecord<CompletionRecord>> = read_json(&record_path).await?;
        let version = next_version(expected_version, found.map(|s| s.version))?;

        let stored = StoredRecord { version, updated_at: Utc::now(), record };
        write_atomic(&record_path, serde_json::to_string_pretty(&stored)?.as_bytes()).await?;

        debug!(%context, version, "stored completion record");
        Ok(version)
    }

    async fn delete_record(&self, context: LearnerContext) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        remove_if_exists(&self.record_path(context)).await
    }
}

/// On-disk form of a completion record.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord<R> {
    version: u64,
    updated_at: DateTime<Utc>,
    record: R,
}

/// Replace `path` with `contents` so that readers see either the old or the
/// new file, never a truncated one. Callers hold the write lock.
async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    fs::remove_file(path).await.or_else(|e| {
        if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lessonpath_core::{CourseTreeBuilder, LearnerId, LessonKind, LessonId};

    fn tree() -> CourseTree {
        let mut b = CourseTreeBuilder::new("json", "JSON");
        let m = b.module("M");
        let g = b.group(m, "G");
        b.lesson(g, "L", LessonKind::Article);
        b.build()
    }

    #[tokio::test]
    async fn test_course_tree_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let tree = tree();

        storage.save_course_tree(&tree).await.unwrap();
        let loaded = storage.get_course_tree(tree.course.id).await.unwrap();
        assert_eq!(loaded, Some(tree.clone()));
        assert_eq!(storage.list_courses().await.unwrap(), vec![tree.course.id]);
        assert!(storage.get_course_tree(CourseId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_versioning() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let ctx = LearnerContext::new(LearnerId::new(), CourseId::new());
        let mut record = CompletionRecord::new(ctx, chrono::Utc::now());

        assert!(storage.get_record(ctx).await.unwrap().is_none());
        assert_eq!(storage.put_record(&record, None).await.unwrap(), 1);

        record.completed.insert(LessonId::new());
        assert_eq!(storage.put_record(&record, Some(1)).await.unwrap(), 2);
        assert!(storage.put_record(&record, Some(1)).await.unwrap_err().is_conflict());

        let loaded = storage.get_record(ctx).await.unwrap().unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.value, record);
    }

    #[tokio::test]
    async fn test_delete_record() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let ctx = LearnerContext::new(LearnerId::new(), CourseId::new());
        let record = CompletionRecord::new(ctx, chrono::Utc::now());

        storage.put_record(&record, None).await.unwrap();
        storage.delete_record(ctx).await.unwrap();
        storage.delete_record(ctx).await.unwrap();

        assert!(storage.get_record(ctx).await.unwrap().is_none());
        // After deletion the record can be created afresh.
        assert_eq!(storage.put_record(&record, None).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_keep_every_acknowledged_insert() {
        let dir = tempfile::tempdir().unwrap();
        let storage = std::sync::Arc::new(JsonStorage::new(dir.path()).await.unwrap());
        let ctx = LearnerContext::new(LearnerId::new(), CourseId::new());
        storage.put_record(&CompletionRecord::new(ctx, chrono::Utc::now()), None).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..24 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                let lesson = LessonId::new();
                loop {
                    let current = storage.get_record(ctx).await.unwrap().unwrap();
                    let mut record = current.value;
                    record.completed.insert(lesson);
                    match storage.put_record(&record, Some(current.version)).await {
                        Ok(_) => return lesson,
                        Err(e) if e.is_conflict() => continue,
                        Err(e) => panic!("unexpected storage error: {e}"),
                    }
                }
            }));
        }

        let mut acknowledged = Vec::new();
        for handle in handles {
            acknowledged.push(handle.await.unwrap());
        }

        let stored = storage.get_record(ctx).await.unwrap().unwrap();
        assert_eq!(stored.version, 25);
        assert_eq!(stored.value.completed.len(), 24);
        assert!(acknowledged.iter().all(|l| stored.value.completed.contains(l)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_never_see_partial_records() {
        let dir = tempfile::tempdir().unwrap();
        let storage = std::sync::Arc::new(JsonStorage::new(dir.path()).await.unwrap());
        let ctx = LearnerContext::new(LearnerId::new(), CourseId::new());
        let mut record = CompletionRecord::new(ctx, chrono::Utc::now());
        storage.put_record(&record, None).await.unwrap();

        let reader = {
            let storage = storage.clone();
            tokio::spawn(async move {
                let mut last = 0;
                for _ in 0..200 {
                    let current = storage.get_record(ctx).await.unwrap().unwrap();
                    assert!(current.version >= last);
                    assert_eq!(current.value.completed.len() as u64, current.version - 1);
                    last = current.version;
                    tokio::task::yield_now().await;
                }
            })
        };

        for version in 1..=50 {
            record.completed.insert(LessonId::new());
            storage.put_record(&record, Some(version)).await.unwrap();
        }
        reader.await.unwrap();
    }
}
