//! Record initialization and reset.
//!
//! A reset is the only path that removes entries from the completion set.

use lessonpath_core::{CompletionRecord, CourseTree, LearnerContext, Time};
use tracing::info;

use crate::deriver::evaluate;

/// Build the initial record for a learner entering a course.
///
/// The resume point is the first lesson progression opens, which is the
/// first lesson of the first module that has any.
pub fn fresh_record(tree: &CourseTree, context: LearnerContext, now: Time) -> CompletionRecord {
    let mut record = CompletionRecord::new(context, now);
    let p = evaluate(tree, &record);
    let current = p.current_ref();
    record.current_module = current
        .map(|r| r.module_id)
        .or_else(|| p.flat.modules.first().map(|m| m.module.id));
    record.current_lesson = current.map(|r| r.lesson_id);
    record
}

/// Replace a learner's progress with a fresh record.
///
/// The enrollment date is kept; everything else starts over.
pub fn reset_record(tree: &CourseTree, record: &CompletionRecord, now: Time) -> CompletionRecord {
    info!(
        context = %record.context(),
        dropped_completions = record.completed.len(),
        "resetting course progress"
    );
    let mut fresh = fresh_record(tree, record.context(), now);
    fresh.enrolled_at = record.enrolled_at;
    fresh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{record_for, two_modules};
    use chrono::Duration;

    #[test]
    fn test_fresh_record_points_at_first_lesson() {
        let f = two_modules();
        let record = record_for(&f.tree);
        assert_eq!(record.current_module, Some(f.m1));
        assert_eq!(record.current_lesson, Some(f.l11));
        assert!(record.completed.is_empty());
    }

    #[test]
    fn test_reset_clears_progress_but_keeps_enrollment() {
        let f = two_modules();
        let mut record = record_for(&f.tree);
        record.enrolled_at = record.enrolled_at - Duration::days(30);
        record.completed.extend([f.l11, f.l12]);
        record.unlocked_modules.insert(f.m2);
        record.current_module = Some(f.m2);
        record.current_lesson = Some(f.l21);

        let now = chrono::Utc::now();
        let reset = reset_record(&f.tree, &record, now);
        assert!(reset.completed.is_empty());
        assert!(reset.unlocked_modules.is_empty());
        assert_eq!(reset.current_module, Some(f.m1));
        assert_eq!(reset.current_lesson, Some(f.l11));
        assert_eq!(reset.enrolled_at, record.enrolled_at);
        assert_eq!(reset.last_accessed_at, now);
        assert_eq!(reset.context(), record.context());
    }

    #[test]
    fn test_fresh_record_skips_empty_modules() {
        let mut b = lessonpath_core::CourseTreeBuilder::new("c", "C");
        b.module("Placeholder");
        let m = b.module("Real");
        let g = b.group(m, "G");
        let l = b.lesson(g, "L", lessonpath_core::LessonKind::Article);
        let tree = b.build();

        let record = record_for(&tree);
        assert_eq!(record.current_module, Some(m));
        assert_eq!(record.current_lesson, Some(l));
    }
}
