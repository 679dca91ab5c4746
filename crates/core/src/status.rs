//! Derived progression view. Never persisted.

use serde::{Deserialize, Serialize};
use crate::course::LessonKind;
use crate::id::{CourseId, GroupId, LessonId, ModuleId};
use crate::validate::StructuralIssue;

/// Derived status of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    /// Not reachable yet
    Locked,
    /// Reachable, not completed
    Unlocked,
    /// In the completion set
    Completed,
}

/// Derived status of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    /// Not reachable yet
    Locked,
    /// The module the learner is working through
    Active,
    /// Every lesson completed
    Completed,
}

/// Full address of a lesson, enough to route to it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LessonRef {
    /// Containing module
    pub module_id: ModuleId,

    /// Containing group
    pub group_id: GroupId,

    /// The lesson
    pub lesson_id: LessonId,
}

/// A lesson annotated with its derived state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedLesson {
    /// Lesson ID
    pub id: LessonId,
    /// Lesson title
    pub title: String,
    /// Order index within the group
    pub order: i32,
    /// Content kind
    pub kind: LessonKind,
    /// Previewable regardless of progression
    pub is_free: bool,
    /// Opaque content reference
    pub content_ref: Option<String>,
    /// Derived status
    pub status: LessonStatus,
    /// The learner's resume point
    pub is_current: bool,
}

/// A group with its annotated lessons in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedGroup {
    /// Group ID
    pub id: GroupId,
    /// Group title
    pub title: String,
    /// Order index within the module
    pub order: i32,
    /// Lessons in course order
    pub lessons: Vec<AnnotatedLesson>,
}

/// A module annotated with its derived state and progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedModule {
    /// Module ID
    pub id: ModuleId,
    /// Module title
    pub title: String,
    /// Order index within the course
    pub order: i32,
    /// Derived status
    pub status: ModuleStatus,

    /// Whether the module is reachable without a further unlock
    pub is_open: bool,

    /// Completed lessons / total lessons, in [0.0, 1.0]
    pub progress: f64,
    /// Lessons of this module in the completion set
    pub completed_lessons: usize,
    /// Lessons of this module
    pub total_lessons: usize,
    /// Groups in course order
    pub groups: Vec<AnnotatedGroup>,
}

impl AnnotatedModule {
    /// Lessons of this module in order.
    pub fn lessons(&self) -> impl Iterator<Item = &AnnotatedLesson> {
        self.groups.iter().flat_map(|g| g.lessons.iter())
    }
}

/// A course tree annotated for one learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedCourse {
    /// Course ID
    pub course_id: CourseId,
    /// URL slug
    pub slug: String,
    /// Course title
    pub title: String,
    /// Modules in course order
    pub modules: Vec<AnnotatedModule>,

    /// The learner's resume point
    pub current: Option<LessonRef>,

    /// The single active module, if any
    pub active_module: Option<ModuleId>,

    /// Whether `unlock_next_module` would succeed
    pub can_unlock_next_module: bool,

    /// The module `unlock_next_module` would open
    pub next_module: Option<ModuleId>,

    /// Completed lessons / total lessons over the whole course
    pub progress: f64,

    /// Every lesson of the course is completed
    pub is_completed: bool,

    /// Structural defects skipped while deriving
    pub issues: Vec<StructuralIssue>,
}

impl AnnotatedCourse {
    /// Look up an annotated module.
    pub fn module(&self, id: ModuleId) -> Option<&AnnotatedModule> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// Every lesson in course order, with its full address.
    pub fn lessons(&self) -> impl Iterator<Item = (LessonRef, &AnnotatedLesson)> {
        self.modules.iter().flat_map(|m| {
            m.groups.iter().flat_map(move |g| {
                g.lessons.iter().map(move |l| {
                    let r = LessonRef { module_id: m.id, group_id: g.id, lesson_id: l.id };
                    (r, l)
                })
            })
        })
    }

    /// Look up an annotated lesson.
    pub fn lesson(&self, id: LessonId) -> Option<&AnnotatedLesson> {
        self.lessons().find(|(r, _)| r.lesson_id == id).map(|(_, l)| l)
    }

    /// Derived status of a lesson.
    pub fn status_of(&self, id: LessonId) -> Option<LessonStatus> {
        self.lesson(id).map(|l| l.status)
    }
}

/// Neighbour of a lesson in course order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavTarget {
    /// Where to route
    pub lesson: LessonRef,

    /// Derived status of the target
    pub status: LessonStatus,

    /// Whether the caller may move there now
    pub actionable: bool,

    /// The target lies in a module that still has to be unlocked
    pub requires_unlock: bool,
}

/// Previous/next neighbours of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Navigation {
    /// Lesson before the viewed one
    pub previous: Option<NavTarget>,
    /// Lesson after the viewed one
    pub next: Option<NavTarget>,
}
