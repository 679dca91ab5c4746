//! Lessonpath core data models.
//!
//! This crate defines the content tree, the persisted completion record and
//! the derived progression view shared by every other crate.

#![warn(missing_docs)]

// Core identities
mod id;

// Content tree
mod course;
mod validate;

// Learner progress
mod record;
mod status;

// Re-exports
pub use id::*;

pub use course::{
    Course, CourseTree, CourseTreeBuilder, Group, Lesson, LessonKind, Module, PublishStatus,
};
pub use validate::StructuralIssue;
pub use record::{CompletionRecord, LearnerContext};
pub use status::{
    AnnotatedCourse, AnnotatedGroup, AnnotatedLesson, AnnotatedModule, LessonRef, LessonStatus,
    ModuleStatus, NavTarget, Navigation,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
