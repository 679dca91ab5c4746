//! Content tree model - Course → Module → Group → Lesson.
//!
//! The tree is stored normalized: the course lists its modules, each module
//! lists its groups and each group lists its lessons. Children also carry a
//! back-reference to their parent and an order index. Authoring tools may
//! leave the two out of sync; [`CourseTree::validate`](crate::CourseTree::validate)
//! reports such defects and the progression engine skips affected entries.

use serde::{Deserialize, Serialize};
use crate::id::{CourseId, GroupId, LessonId, ModuleId};

/// A course: the root of the content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Unique identifier
    pub id: CourseId,

    /// URL slug
    pub slug: String,

    /// Display title
    pub title: String,

    /// Modules of this course, in authoring order
    pub modules: Vec<ModuleId>,

    /// Whether the course is free of charge
    pub is_free: bool,

    /// Publish status
    pub status: PublishStatus,
}

/// Publish status of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    /// Work in progress, only visible to authors
    Draft,
    /// Visible to learners
    Published,
    /// No longer offered to new learners
    Archived,
}

/// A module: the unit of locking and unlocking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Unique identifier
    pub id: ModuleId,

    /// Parent course
    pub course_id: CourseId,

    /// Order index within the course (gap-tolerant)
    pub order: i32,

    /// Display title
    pub title: String,

    /// Groups of this module
    pub groups: Vec<GroupId>,
}

/// A group: an ordered cluster of lessons within a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier
    pub id: GroupId,

    /// Parent module
    pub module_id: ModuleId,

    /// Order index within the module
    pub order: i32,

    /// Display title
    pub title: String,

    /// Lessons of this group
    pub lessons: Vec<LessonId>,
}

/// A lesson: the smallest unit a learner completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    /// Unique identifier
    pub id: LessonId,

    /// Parent group
    pub group_id: GroupId,

    /// Order index within the group
    pub order: i32,

    /// Display title
    pub title: String,

    /// Kind of content
    pub kind: LessonKind,

    /// Accessible without progression gating
    #[serde(default)]
    pub is_free: bool,

    /// Opaque content reference (video URL, article key, ...)
    #[serde(default)]
    pub content_ref: Option<String>,
}

/// Kind of lesson content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    /// Recorded video
    Video,
    /// Graded questions
    Quiz,
    /// Hands-on exercise
    Project,
    /// Reading material
    Article,
}

/// Complete structural tree of one course version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseTree {
    /// The course itself
    pub course: Course,

    /// All modules of the course
    pub modules: Vec<Module>,

    /// All groups of the course
    pub groups: Vec<Group>,

    /// All lessons of the course
    pub lessons: Vec<Lesson>,
}

impl CourseTree {
    /// Look up a module by ID.
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// Look up a group by ID.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Look up a lesson by ID.
    pub fn lesson(&self, id: LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }
}

/// Incremental builder for [`CourseTree`].
///
/// Order indices are assigned in insertion order with gaps of ten, so that
/// content can later be inserted between existing entries.
#[derive(Debug, Clone)]
pub struct CourseTreeBuilder {
    tree: CourseTree,
}

impl CourseTreeBuilder {
    /// Start a new published course.
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            tree: CourseTree {
                course: Course {
                    id: CourseId::new(),
                    slug: slug.into(),
                    title: title.into(),
                    modules: Vec::new(),
                    is_free: false,
                    status: PublishStatus::Published,
                },
                modules: Vec::new(),
                groups: Vec::new(),
                lessons: Vec::new(),
            },
        }
    }

    /// Mark the course free of charge.
    pub fn free(mut self) -> Self {
        self.tree.course.is_free = true;
        self
    }

    /// ID of the course being built.
    pub fn course_id(&self) -> CourseId {
        self.tree.course.id
    }

    /// Append a module to the course.
    pub fn module(&mut self, title: impl Into<String>) -> ModuleId {
        let id = ModuleId::new();
        let order = next_order(self.tree.course.modules.len());
        self.tree.modules.push(Module {
            id,
            course_id: self.tree.course.id,
            order,
            title: title.into(),
            groups: Vec::new(),
        });
        self.tree.course.modules.push(id);
        id
    }

    /// Append a group to a module. Unknown modules get a dangling group.
    pub fn group(&mut self, module_id: ModuleId, title: impl Into<String>) -> GroupId {
        let id = GroupId::new();
        let position = match self.tree.modules.iter_mut().find(|m| m.id == module_id) {
            Some(module) => {
                module.groups.push(id);
                module.groups.len() - 1
            }
            None => 0,
        };
        self.tree.groups.push(Group {
            id,
            module_id,
            order: next_order(position),
            title: title.into(),
            lessons: Vec::new(),
        });
        id
    }

    /// Append a gated lesson to a group.
    pub fn lesson(&mut self, group_id: GroupId, title: impl Into<String>, kind: LessonKind) -> LessonId {
        self.push_lesson(group_id, title.into(), kind, false)
    }

    /// Append a free-preview lesson to a group.
    pub fn free_lesson(&mut self, group_id: GroupId, title: impl Into<String>, kind: LessonKind) -> LessonId {
        self.push_lesson(group_id, title.into(), kind, true)
    }

    fn push_lesson(&mut self, group_id: GroupId, title: String, kind: LessonKind, is_free: bool) -> LessonId {
        let id = LessonId::new();
        let position = match self.tree.groups.iter_mut().find(|g| g.id == group_id) {
            Some(group) => {
                group.lessons.push(id);
                group.lessons.len() - 1
            }
            None => 0,
        };
        self.tree.lessons.push(Lesson {
            id,
            group_id,
            order: next_order(position),
            title,
            kind,
            is_free,
            content_ref: None,
        });
        id
    }

    /// Finish building.
    pub fn build(self) -> CourseTree {
        self.tree
    }
}

fn next_order(position: usize) -> i32 {
    (position as i32 + 1) * 10
}
