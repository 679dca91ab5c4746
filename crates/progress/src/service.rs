//! Progression service - the API exposed to the UI/API layer.
//!
//! Every mutating operation reads the course tree and the learner's record,
//! derives the new record and writes it back with a compare-and-swap on the
//! record version. A lost race is retried from a fresh read up to
//! [`EngineConfig::max_write_attempts`] times before `Conflict` is surfaced.

use std::sync::Arc;
use async_trait::async_trait;
use chrono::Utc;
use lessonpath_core::{
    AnnotatedCourse, CompletionRecord, CourseTree, LearnerContext, LessonId, LessonRef, Navigation,
};
use lessonpath_storage::{CompletionStore, ContentTreeProvider, Versioned};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::{completion, deriver, navigation, reset, unlock};

/// Course progression operations for one (learner, course) context.
#[async_trait]
pub trait CourseProgression: Send + Sync {
    /// Enroll the learner, creating the initial record. Idempotent.
    async fn enroll(&self, context: LearnerContext) -> Result<AnnotatedCourse>;

    /// Remove the learner's record for the course.
    async fn unenroll(&self, context: LearnerContext) -> Result<()>;

    /// The course annotated with the learner's derived state.
    async fn get_annotated_course(&self, context: LearnerContext) -> Result<AnnotatedCourse>;

    /// Mark a lesson completed.
    async fn complete_lesson(&self, context: LearnerContext, lesson_id: LessonId) -> Result<AnnotatedCourse>;

    /// Make a non-locked lesson the learner's resume point.
    async fn open_lesson(&self, context: LearnerContext, lesson_id: LessonId) -> Result<AnnotatedCourse>;

    /// Unlock the module after the completed working module.
    async fn unlock_next_module(&self, context: LearnerContext) -> Result<AnnotatedCourse>;

    /// Unlock the next module and jump to its first lesson.
    async fn continue_to_next_module(
        &self,
        context: LearnerContext,
    ) -> Result<(AnnotatedCourse, Option<LessonRef>)>;

    /// Start the course over.
    async fn reset_course(&self, context: LearnerContext) -> Result<AnnotatedCourse>;

    /// Previous/next neighbours of a lesson.
    async fn get_navigation(&self, context: LearnerContext, lesson_id: LessonId) -> Result<Navigation>;

    /// Where the learner should pick up.
    async fn resume(&self, context: LearnerContext) -> Result<Option<LessonRef>>;
}

/// Outcome of one derive step inside a write cycle.
enum Step<T> {
    /// Persist the record, then return the value
    Write(CompletionRecord, T),
    /// Nothing to persist
    Keep(T),
}

/// Default [`CourseProgression`] implementation over the storage seams.
pub struct ProgressionService<P, S> {
    trees: Arc<P>,
    store: Arc<S>,
    config: EngineConfig,
}

impl<P: ContentTreeProvider, S: CompletionStore> ProgressionService<P, S> {
    /// Create a service with default configuration.
    pub fn new(trees: Arc<P>, store: Arc<S>) -> Self {
        Self {
            trees,
            store,
            config: EngineConfig::default(),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn load_tree(&self, context: LearnerContext) -> Result<CourseTree> {
        self.trees
            .get_course_tree(context.course_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("course {}", context.course_id)))
    }

    async fn load_record(&self, context: LearnerContext) -> Result<Versioned<CompletionRecord>> {
        self.store
            .get_record(context)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("enrollment {}", context)))
    }

    /// Run a derive-and-write cycle with optimistic concurrency.
    async fn transact<T, F>(&self, context: LearnerContext, operation: &str, step: F) -> Result<T>
    where
        T: Send,
        F: Fn(&CourseTree, &CompletionRecord) -> Result<Step<T>> + Send + Sync,
    {
        let attempts = self.config.max_write_attempts.max(1);
        for attempt in 1..=attempts {
            let tree = self.load_tree(context).await?;
            let current = self.load_record(context).await?;

            let (record, value) = match step(&tree, &current.value)? {
                Step::Keep(value) => return Ok(value),
                Step::Write(record, value) => (record, value),
            };

            match self.store.put_record(&record, Some(current.version)).await {
                Ok(version) => {
                    debug!(%context, operation, version, "record written");
                    return Ok(value);
                }
                Err(e) if e.is_conflict() => {
                    warn!(%context, operation, attempt, "write conflict, re-deriving");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(EngineError::Conflict(context.to_string()))
    }
}

#[async_trait]
impl<P, S> CourseProgression for ProgressionService<P, S>
where
    P: ContentTreeProvider + 'static,
    S: CompletionStore + 'static,
{
    async fn enroll(&self, context: LearnerContext) -> Result<AnnotatedCourse> {
        let attempts = self.config.max_write_attempts.max(1);
        for _ in 0..attempts {
            let tree = self.load_tree(context).await?;
            if let Some(existing) = self.store.get_record(context).await? {
                return Ok(deriver::derive(&tree, &existing.value));
            }

            let record = reset::fresh_record(&tree, context, Utc::now());
            match self.store.put_record(&record, None).await {
                Ok(_) => {
                    info!(%context, "learner enrolled");
                    return Ok(deriver::derive(&tree, &record));
                }
                // Enrolled concurrently; the next pass returns that record.
                Err(e) if e.is_conflict() => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(EngineError::Conflict(context.to_string()))
    }

    async fn unenroll(&self, context: LearnerContext) -> Result<()> {
        self.store.delete_record(context).await?;
        info!(%context, "learner unenrolled");
        Ok(())
    }

    async fn get_annotated_course(&self, context: LearnerContext) -> Result<AnnotatedCourse> {
        let tree = self.load_tree(context).await?;
        let record = self.load_record(context).await?;
        Ok(deriver::derive(&tree, &record.value))
    }

    async fn complete_lesson(&self, context: LearnerContext, lesson_id: LessonId) -> Result<AnnotatedCourse> {
        self.transact(context, "complete_lesson", |tree, record| {
            Ok(match completion::complete_lesson(tree, record, lesson_id)? {
                Some(mut updated) => {
                    updated.last_accessed_at = Utc::now();
                    let course = deriver::derive(tree, &updated);
                    Step::Write(updated, course)
                }
                None => Step::Keep(deriver::derive(tree, record)),
            })
        })
        .await
    }

    async fn open_lesson(&self, context: LearnerContext, lesson_id: LessonId) -> Result<AnnotatedCourse> {
        self.transact(context, "open_lesson", |tree, record| {
            let mut updated = completion::open_lesson(tree, record, lesson_id)?;
            updated.last_accessed_at = Utc::now();
            let course = deriver::derive(tree, &updated);
            Ok(Step::Write(updated, course))
        })
        .await
    }

    async fn unlock_next_module(&self, context: LearnerContext) -> Result<AnnotatedCourse> {
        self.transact(context, "unlock_next_module", |tree, record| {
            let mut updated = unlock::unlock_next_module(tree, record)?;
            let course = deriver::derive(tree, &updated);
            if &updated == record {
                return Ok(Step::Keep(course));
            }
            updated.last_accessed_at = Utc::now();
            Ok(Step::Write(updated, course))
        })
        .await
    }

    async fn continue_to_next_module(
        &self,
        context: LearnerContext,
    ) -> Result<(AnnotatedCourse, Option<LessonRef>)> {
        self.transact(context, "continue_to_next_module", |tree, record| {
            let mut advance = unlock::continue_to_next_module(tree, record)?;
            let course = deriver::derive(tree, &advance.record);
            if &advance.record == record {
                return Ok(Step::Keep((course, advance.next_lesson)));
            }
            advance.record.last_accessed_at = Utc::now();
            Ok(Step::Write(advance.record, (course, advance.next_lesson)))
        })
        .await
    }

    async fn reset_course(&self, context: LearnerContext) -> Result<AnnotatedCourse> {
        self.transact(context, "reset_course", |tree, record| {
            let fresh = reset::reset_record(tree, record, Utc::now());
            let course = deriver::derive(tree, &fresh);
            Ok(Step::Write(fresh, course))
        })
        .await
    }

    async fn get_navigation(&self, context: LearnerContext, lesson_id: LessonId) -> Result<Navigation> {
        let tree = self.load_tree(context).await?;
        let record = self.load_record(context).await?;
        navigation::resolve(&tree, &record.value, lesson_id)
    }

    async fn resume(&self, context: LearnerContext) -> Result<Option<LessonRef>> {
        self.transact(context, "resume", |tree, record| {
            let mut updated = record.clone();
            completion::heal_current_lesson(tree, &mut updated);
            updated.last_accessed_at = Utc::now();
            let current = deriver::derive(tree, &updated).current;
            Ok(Step::Write(updated, current))
        })
        .await
    }
}
