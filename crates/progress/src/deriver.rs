//! Progress state derivation.
//!
//! Turns a content tree and a completion record into per-lesson and
//! per-module state. Nothing computed here is ever persisted.
//!
//! Module openness: the first module with lessons (and any empty module before
//! it) is always open, and so is every module whose order index does not
//! exceed that of the furthest explicitly unlocked module. An empty module
//! directly after an open one is open too. Lessons then follow straight-line progression through open modules:
//! completed lessons stay completed, the first incomplete one is unlocked and
//! everything after it is locked. Free lessons are always previewable.

use lessonpath_core::{
    AnnotatedCourse, AnnotatedGroup, AnnotatedLesson, AnnotatedModule, CompletionRecord, CourseTree,
    LessonRef, LessonStatus, ModuleStatus, StructuralIssue,
};
use tracing::warn;

use crate::flatten::{flatten, Flattened};

/// Per-module lesson counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LessonCounts {
    pub completed: usize,
    pub total: usize,
}

impl LessonCounts {
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

/// Evaluated progression state over a flattened tree.
#[derive(Debug, Clone)]
pub(crate) struct Progression<'a> {
    pub flat: Flattened<'a>,
    pub module_open: Vec<bool>,
    pub module_status: Vec<ModuleStatus>,
    pub module_counts: Vec<LessonCounts>,
    pub lesson_status: Vec<LessonStatus>,
    /// Index of the current lesson
    pub current: Option<usize>,
    /// The active module, or the last open module when none is active
    pub working_module: Option<usize>,
}

impl<'a> Progression<'a> {
    /// The module after the working module.
    pub fn next_module(&self) -> Option<usize> {
        self.working_module
            .map(|w| w + 1)
            .filter(|n| *n < self.flat.modules.len())
    }

    /// Whether the working module is complete and a locked module follows it.
    pub fn can_unlock_next_module(&self) -> bool {
        let Some(working) = self.working_module else {
            return false;
        };
        self.module_counts[working].is_complete()
            && self.next_module().is_some_and(|n| !self.module_open[n])
    }

    /// Address of the current lesson.
    pub fn current_ref(&self) -> Option<LessonRef> {
        self.current.map(|i| self.flat.lessons[i].at)
    }
}

/// Evaluate progression for a record against a tree.
pub(crate) fn evaluate<'a>(tree: &'a CourseTree, record: &CompletionRecord) -> Progression<'a> {
    let flat = flatten(tree);

    // Modules without lessons cannot gate anything, so the first module with
    // lessons is open from the start.
    let first_gate = flat.modules.iter().position(|m| !m.lessons.is_empty()).unwrap_or(0);

    // Furthest order index reachable without a further unlock.
    let frontier = flat
        .modules
        .iter()
        .enumerate()
        .filter(|(i, m)| *i <= first_gate || record.is_unlocked(m.module.id))
        .map(|(_, m)| m.module.order)
        .max();

    let mut module_open: Vec<bool> = Vec::with_capacity(flat.modules.len());
    for m in &flat.modules {
        let open = frontier.is_some_and(|f| m.module.order <= f)
            || record.is_unlocked(m.module.id)
            // An empty module right after an open one is passed through.
            || (m.lessons.is_empty() && module_open.last() == Some(&true));
        module_open.push(open);
    }

    let module_counts: Vec<LessonCounts> = flat
        .modules
        .iter()
        .map(|m| LessonCounts {
            completed: flat.lessons[m.lessons.clone()]
                .iter()
                .filter(|l| record.is_completed(l.lesson.id))
                .count(),
            total: m.lessons.len(),
        })
        .collect();

    let mut active_seen = false;
    let module_status: Vec<ModuleStatus> = module_open
        .iter()
        .zip(&module_counts)
        .map(|(open, counts)| {
            if !open {
                ModuleStatus::Locked
            } else if counts.is_complete() {
                ModuleStatus::Completed
            } else if !active_seen {
                active_seen = true;
                ModuleStatus::Active
            } else {
                // Open but waiting behind an incomplete earlier module,
                // only reachable through content edits.
                ModuleStatus::Locked
            }
        })
        .collect();

    let mut progression_open = true;
    let lesson_status: Vec<LessonStatus> = flat
        .lessons
        .iter()
        .map(|l| {
            if !module_open[l.module_index] {
                if l.lesson.is_free { LessonStatus::Unlocked } else { LessonStatus::Locked }
            } else if record.is_completed(l.lesson.id) {
                LessonStatus::Completed
            } else if progression_open {
                progression_open = false;
                LessonStatus::Unlocked
            } else if l.lesson.is_free {
                LessonStatus::Unlocked
            } else {
                LessonStatus::Locked
            }
        })
        .collect();

    let stored = record.current_lesson.and_then(|id| flat.position(id));
    let current = stored
        .filter(|i| lesson_status[*i] == LessonStatus::Unlocked)
        .or_else(|| lesson_status.iter().position(|s| *s == LessonStatus::Unlocked))
        .or_else(|| stored.filter(|i| lesson_status[*i] == LessonStatus::Completed))
        .or_else(|| lesson_status.iter().rposition(|s| *s == LessonStatus::Completed));

    let working_module = module_status
        .iter()
        .position(|s| *s == ModuleStatus::Active)
        .or_else(|| module_open.iter().rposition(|open| *open));

    Progression {
        flat,
        module_open,
        module_status,
        module_counts,
        lesson_status,
        current,
        working_module,
    }
}

/// Derive the annotated view of a course for one learner.
///
/// Never fails: structurally inconsistent entries are logged, left out and
/// listed in [`AnnotatedCourse::issues`].
pub fn derive(tree: &CourseTree, record: &CompletionRecord) -> AnnotatedCourse {
    let issues = tree.validate();
    for issue in &issues {
        warn!(course_id = %tree.course.id, %issue, "skipping inconsistent course structure");
    }

    let p = evaluate(tree, record);
    annotate(tree, &p, issues)
}

fn annotate(tree: &CourseTree, p: &Progression<'_>, issues: Vec<StructuralIssue>) -> AnnotatedCourse {
    let modules = p
        .flat
        .modules
        .iter()
        .enumerate()
        .map(|(mi, m)| {
            let counts = p.module_counts[mi];
            let groups = m
                .groups
                .iter()
                .map(|g| AnnotatedGroup {
                    id: g.group.id,
                    title: g.group.title.clone(),
                    order: g.group.order,
                    lessons: g
                        .lessons
                        .clone()
                        .map(|li| {
                            let lesson = p.flat.lessons[li].lesson;
                            AnnotatedLesson {
                                id: lesson.id,
                                title: lesson.title.clone(),
                                order: lesson.order,
                                kind: lesson.kind,
                                is_free: lesson.is_free,
                                content_ref: lesson.content_ref.clone(),
                                status: p.lesson_status[li],
                                is_current: p.current == Some(li),
                            }
                        })
                        .collect(),
                })
                .collect();

            AnnotatedModule {
                id: m.module.id,
                title: m.module.title.clone(),
                order: m.module.order,
                status: p.module_status[mi],
                is_open: p.module_open[mi],
                progress: counts.progress(),
                completed_lessons: counts.completed,
                total_lessons: counts.total,
                groups,
            }
        })
        .collect();

    let course_counts = p.module_counts.iter().fold(LessonCounts::default(), |acc, c| LessonCounts {
        completed: acc.completed + c.completed,
        total: acc.total + c.total,
    });

    AnnotatedCourse {
        course_id: tree.course.id,
        slug: tree.course.slug.clone(),
        title: tree.course.title.clone(),
        modules,
        current: p.current_ref(),
        active_module: p
            .module_status
            .iter()
            .position(|s| *s == ModuleStatus::Active)
            .map(|i| p.flat.modules[i].module.id),
        can_unlock_next_module: p.can_unlock_next_module(),
        next_module: p.next_module().map(|i| p.flat.modules[i].module.id),
        progress: course_counts.progress(),
        is_completed: course_counts.is_complete(),
        issues,
    }
}
