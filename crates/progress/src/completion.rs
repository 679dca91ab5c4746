//! Lesson completion and resume-point bookkeeping.

use lessonpath_core::{CompletionRecord, CourseTree, LessonId, LessonStatus};
use tracing::debug;

use crate::deriver::evaluate;
use crate::error::{EngineError, Result};

/// Mark a lesson completed.
///
/// Returns `None` when the lesson is already completed. Locked lessons
/// cannot be completed. On success the resume point moves to wherever
/// progression now leads.
pub fn complete_lesson(
    tree: &CourseTree,
    record: &CompletionRecord,
    lesson_id: LessonId,
) -> Result<Option<CompletionRecord>> {
    if record.is_completed(lesson_id) {
        debug!(context = %record.context(), %lesson_id, "lesson already completed");
        return Ok(None);
    }

    match lesson_status(tree, record, lesson_id)? {
        LessonStatus::Locked => Err(EngineError::PreconditionFailed(format!(
            "lesson {} is locked",
            lesson_id
        ))),
        _ => {
            let mut updated = record.clone();
            updated.completed.insert(lesson_id);
            heal_current_lesson(tree, &mut updated);
            Ok(Some(updated))
        }
    }
}

/// Record a lesson as the learner's resume point.
pub fn open_lesson(tree: &CourseTree, record: &CompletionRecord, lesson_id: LessonId) -> Result<CompletionRecord> {
    if lesson_status(tree, record, lesson_id)? == LessonStatus::Locked {
        return Err(EngineError::PreconditionFailed(format!(
            "lesson {} is locked",
            lesson_id
        )));
    }
    let mut updated = record.clone();
    updated.current_lesson = Some(lesson_id);
    Ok(updated)
}

/// Store the derived current lesson back into the record.
///
/// Returns whether the record changed.
pub fn heal_current_lesson(tree: &CourseTree, record: &mut CompletionRecord) -> bool {
    let current = evaluate(tree, record).current_ref().map(|r| r.lesson_id);
    if record.current_lesson == current {
        return false;
    }
    debug!(context = %record.context(), from = ?record.current_lesson, to = ?current, "healed current lesson");
    record.current_lesson = current;
    true
}

fn lesson_status(tree: &CourseTree, record: &CompletionRecord, lesson_id: LessonId) -> Result<LessonStatus> {
    let p = evaluate(tree, record);
    match p.flat.position(lesson_id) {
        Some(i) => Ok(p.lesson_status[i]),
        None if tree.lesson(lesson_id).is_some() => Err(EngineError::StructuralInconsistency(format!(
            "lesson {} is not reachable from its course",
            lesson_id
        ))),
        None => Err(EngineError::NotFound(format!("lesson {}", lesson_id))),
    }
}
