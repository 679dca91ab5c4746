//! Completion record - a learner's persisted progress in one course.

use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};
use crate::id::{CourseId, LearnerId, LessonId, ModuleId};
use crate::Time;

/// The (learner, course) pair every progression operation acts on.
///
/// Resolved upstream by authentication middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LearnerContext {
    /// The learner
    pub learner_id: LearnerId,

    /// The active course
    pub course_id: CourseId,
}

impl LearnerContext {
    /// Create a new context.
    pub fn new(learner_id: LearnerId, course_id: CourseId) -> Self {
        Self { learner_id, course_id }
    }
}

impl std::fmt::Display for LearnerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.learner_id, self.course_id)
    }
}

/// Stored progress of one learner in one course.
///
/// Only raw facts are stored here; lesson and module statuses are derived
/// from this record and the content tree on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// The learner
    pub learner_id: LearnerId,

    /// The course
    pub course_id: CourseId,

    /// Completed lessons. Append-only outside of a reset.
    pub completed: BTreeSet<LessonId>,

    /// Module the learner is working in
    pub current_module: Option<ModuleId>,

    /// Lesson the learner resumes at
    pub current_lesson: Option<LessonId>,

    /// Modules explicitly unlocked by the learner
    pub unlocked_modules: BTreeSet<ModuleId>,

    /// When the learner enrolled
    pub enrolled_at: Time,

    /// Last time the learner touched this course
    pub last_accessed_at: Time,
}

impl CompletionRecord {
    /// Create an empty record for a new enrollment.
    pub fn new(context: LearnerContext, enrolled_at: Time) -> Self {
        Self {
            learner_id: context.learner_id,
            course_id: context.course_id,
            completed: BTreeSet::new(),
            current_module: None,
            current_lesson: None,
            unlocked_modules: BTreeSet::new(),
            enrolled_at,
            last_accessed_at: enrolled_at,
        }
    }

    /// The (learner, course) pair this record belongs to.
    pub fn context(&self) -> LearnerContext {
        LearnerContext::new(self.learner_id, self.course_id)
    }

    /// Whether a lesson is in the completion set.
    pub fn is_completed(&self, lesson_id: LessonId) -> bool {
        self.completed.contains(&lesson_id)
    }

    /// Whether a module was explicitly unlocked.
    pub fn is_unlocked(&self, module_id: ModuleId) -> bool {
        self.unlocked_modules.contains(&module_id)
    }
}
