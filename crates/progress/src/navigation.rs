//! Previous/next navigation across module and group boundaries.

use lessonpath_core::{CompletionRecord, CourseTree, LessonId, LessonStatus, NavTarget, Navigation};

use crate::deriver::{evaluate, Progression};
use crate::error::{EngineError, Result};

/// Resolve the neighbours of a lesson in course order.
///
/// Going back is always allowed. Going forward is only actionable once the
/// viewed lesson is completed, and a neighbour inside a locked module is
/// still returned for display but flagged as requiring an unlock.
pub fn resolve(tree: &CourseTree, record: &CompletionRecord, lesson_id: LessonId) -> Result<Navigation> {
    let p = evaluate(tree, record);
    let Some(position) = p.flat.position(lesson_id) else {
        return Err(if tree.lesson(lesson_id).is_some() {
            EngineError::StructuralInconsistency(format!("lesson {} is not reachable from its course", lesson_id))
        } else {
            EngineError::NotFound(format!("lesson {}", lesson_id))
        });
    };

    let viewed_completed = p.lesson_status[position] == LessonStatus::Completed;

    let previous = position.checked_sub(1).map(|i| target(&p, i, |_| true));
    let next = Some(position + 1)
        .filter(|i| *i < p.flat.lessons.len())
        .map(|i| target(&p, i, |requires_unlock| viewed_completed && !requires_unlock));

    Ok(Navigation { previous, next })
}

fn target(p: &Progression<'_>, index: usize, actionable: impl Fn(bool) -> bool) -> NavTarget {
    let lesson = &p.flat.lessons[index];
    let requires_unlock = !p.module_open[lesson.module_index];
    NavTarget {
        lesson: lesson.at,
        status: p.lesson_status[index],
        actionable: actionable(requires_unlock),
        requires_unlock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{record_for, three_modules, two_modules};
    use lessonpath_core::GroupId;

    #[test]
    fn test_first_lesson_has_no_previous() {
        let f = two_modules();
        let nav = resolve(&f.tree, &record_for(&f.tree), f.l11).unwrap();
        assert!(nav.previous.is_none());

        let next = nav.next.unwrap();
        assert_eq!(next.lesson.lesson_id, f.l12);
        assert_eq!(next.status, LessonStatus::Locked);
        assert!(!next.actionable);
        assert!(!next.requires_unlock);
    }

    #[test]
    fn test_next_actionable_after_completion() {
        let f = two_modules();
        let mut record = record_for(&f.tree);
        record.completed.insert(f.l11);

        let next = resolve(&f.tree, &record, f.l11).unwrap().next.unwrap();
        assert!(next.actionable);
        assert_eq!(next.status, LessonStatus::Unlocked);
    }

    #[test]
    fn test_crossing_into_locked_module() {
        let f = two_modules();
        let mut record = record_for(&f.tree);
        record.completed.extend([f.l11, f.l12]);

        let nav = resolve(&f.tree, &record, f.l12).unwrap();
        let next = nav.next.unwrap();
        assert_eq!(next.lesson.lesson_id, f.l21);
        assert_eq!(next.lesson.module_id, f.m2);
        assert!(next.requires_unlock);
        assert!(!next.actionable);

        record.unlocked_modules.insert(f.m2);
        let next = resolve(&f.tree, &record, f.l12).unwrap().next.unwrap();
        assert!(!next.requires_unlock);
        assert!(next.actionable);
    }

    #[test]
    fn test_previous_always_actionable() {
        let f = three_modules();
        let record = record_for(&f.tree);

        // Viewing the free preview inside a locked module.
        let nav = resolve(&f.tree, &record, f.free).unwrap();
        let previous = nav.previous.unwrap();
        assert_eq!(previous.lesson.lesson_id, f.lessons[4]);
        assert!(previous.actionable);
        assert_eq!(previous.status, LessonStatus::Locked);
    }

    #[test]
    fn test_crosses_group_boundaries() {
        let f = three_modules();
        let record = record_for(&f.tree);
        let nav = resolve(&f.tree, &record, f.lessons[1]).unwrap();
        assert_eq!(nav.previous.unwrap().lesson.lesson_id, f.lessons[0]);
        assert_ne!(nav.previous.unwrap().lesson.group_id, nav.next.unwrap().lesson.group_id);
        assert_eq!(nav.next.unwrap().lesson.lesson_id, f.lessons[2]);
    }

    #[test]
    fn test_last_lesson_has_no_next() {
        let f = three_modules();
        let nav = resolve(&f.tree, &record_for(&f.tree), f.lessons[6]).unwrap();
        assert!(nav.next.is_none());
    }

    #[test]
    fn test_symmetry_over_whole_course() {
        let f = three_modules();
        let record = record_for(&f.tree);
        for pair in f.lessons.windows(2) {
            let a = resolve(&f.tree, &record, pair[0]).unwrap();
            let b = resolve(&f.tree, &record, pair[1]).unwrap();
            assert_eq!(a.next.unwrap().lesson.lesson_id, pair[1]);
            assert_eq!(b.previous.unwrap().lesson.lesson_id, pair[0]);
        }
    }

    #[test]
    fn test_unknown_and_orphaned_lessons() {
        let f = two_modules();
        let record = record_for(&f.tree);
        assert!(matches!(
            resolve(&f.tree, &record, LessonId::new()),
            Err(EngineError::NotFound(_))
        ));

        let mut tree = f.tree.clone();
        tree.lessons.iter_mut().find(|l| l.id == f.l21).unwrap().group_id = GroupId::new();
        assert!(matches!(
            resolve(&tree, &record, f.l21),
            Err(EngineError::StructuralInconsistency(_))
        ));
    }

    #[test]
    fn test_module_waiting_behind_edit_needs_no_unlock() {
        let f = two_modules();
        let mut record = record_for(&f.tree);
        record.completed.extend([f.l11, f.l12]);
        record.unlocked_modules.insert(f.m2);

        // A lesson appended to module 1 reopens it; module 2 stays open but waits.
        let mut tree = f.tree.clone();
        let g1 = tree.module(f.m1).unwrap().groups[0];
        let added = LessonId::new();
        tree.groups.iter_mut().find(|g| g.id == g1).unwrap().lessons.push(added);
        tree.lessons.push(lessonpath_core::Lesson {
            id: added,
            group_id: g1,
            order: 30,
            title: "Added".to_string(),
            kind: lessonpath_core::LessonKind::Article,
            is_free: false,
            content_ref: None,
        });

        let next = resolve(&tree, &record, added).unwrap().next.unwrap();
        assert_eq!(next.lesson.lesson_id, f.l21);
        assert!(!next.requires_unlock);
        assert!(!next.actionable);

        record.completed.insert(added);
        let next = resolve(&tree, &record, added).unwrap().next.unwrap();
        assert!(!next.requires_unlock);
        assert!(next.actionable);
    }
}
