//! Module unlock policy.
//!
//! A module is advanced past only once every lesson in it is completed.
//! Unlocking is not a counted action: repeating it right after a successful
//! unlock, before any non-free lesson of the new module is completed, leaves
//! the record unchanged instead of failing.

use lessonpath_core::{CompletionRecord, CourseTree, LessonRef, ModuleId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::completion::heal_current_lesson;
use crate::deriver::{evaluate, Progression};
use crate::error::{EngineError, Result};

/// Result of [`continue_to_next_module`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleAdvance {
    /// The updated record
    pub record: CompletionRecord,

    /// First lesson of the module now being worked on
    pub next_lesson: Option<LessonRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnlockPlan {
    /// Open the module at this index
    Unlock(usize),
    /// The module at this index was just unlocked; nothing to do
    AlreadyUnlocked(usize),
}

fn plan(p: &Progression<'_>, record: &CompletionRecord) -> Result<UnlockPlan> {
    let Some(working) = p.working_module else {
        return Err(EngineError::PreconditionFailed("course has no modules".to_string()));
    };
    let module = p.flat.modules[working].module;
    let counts = p.module_counts[working];

    if counts.is_complete() {
        return match p.next_module() {
            Some(next) if !p.module_open[next] => Ok(UnlockPlan::Unlock(next)),
            Some(next) => Ok(UnlockPlan::AlreadyUnlocked(next)),
            None => Err(EngineError::PreconditionFailed(format!(
                "module '{}' is the last module of the course",
                module.title
            ))),
        };
    }

    // Completed free previews do not count as work done in the module.
    let progressed = p.flat.lessons[p.flat.modules[working].lessons.clone()]
        .iter()
        .any(|l| !l.lesson.is_free && record.is_completed(l.lesson.id));
    if record.is_unlocked(module.id) && record.current_module == Some(module.id) && !progressed {
        return Ok(UnlockPlan::AlreadyUnlocked(working));
    }

    Err(EngineError::PreconditionFailed(format!(
        "module '{}' is not completed ({} of {} lessons)",
        module.title, counts.completed, counts.total
    )))
}

/// Unlock the module following the completed working module.
///
/// The current lesson is left as is; derivation moves the resume point into
/// the new module.
pub fn unlock_next_module(tree: &CourseTree, record: &CompletionRecord) -> Result<CompletionRecord> {
    let p = evaluate(tree, record);
    match plan(&p, record)? {
        UnlockPlan::Unlock(next) => {
            let module_id = p.flat.modules[next].module.id;
            let mut updated = record.clone();
            updated.unlocked_modules.insert(module_id);
            updated.current_module = Some(module_id);
            info!(context = %record.context(), %module_id, "unlocked module");
            Ok(updated)
        }
        UnlockPlan::AlreadyUnlocked(index) => {
            debug!(
                context = %record.context(),
                module_id = %p.flat.modules[index].module.id,
                "module already unlocked"
            );
            Ok(record.clone())
        }
    }
}

/// Unlock the next module and move the resume point to its first lesson.
pub fn continue_to_next_module(tree: &CourseTree, record: &CompletionRecord) -> Result<ModuleAdvance> {
    let p = evaluate(tree, record);
    match plan(&p, record)? {
        UnlockPlan::Unlock(next) => {
            let module_id = p.flat.modules[next].module.id;
            let mut updated = record.clone();
            updated.unlocked_modules.insert(module_id);
            updated.current_module = Some(module_id);
            if let Some(lesson) = p.flat.first_lesson_of(next) {
                updated.current_lesson = Some(lesson.lesson_id);
            }
            // The first lesson may already be completed as a free preview.
            heal_current_lesson(tree, &mut updated);
            let next_lesson = landing(tree, &updated, module_id);
            info!(context = %record.context(), %module_id, "continued to next module");
            Ok(ModuleAdvance { record: updated, next_lesson })
        }
        UnlockPlan::AlreadyUnlocked(index) => {
            let module_id = p.flat.modules[index].module.id;
            Ok(ModuleAdvance {
                record: record.clone(),
                next_lesson: landing(tree, record, module_id),
            })
        }
    }
}

/// Where the learner lands in a module: the derived current lesson when it
/// lies in that module, otherwise the module's first lesson.
fn landing(tree: &CourseTree, record: &CompletionRecord, module_id: ModuleId) -> Option<LessonRef> {
    let p = evaluate(tree, record);
    p.current_ref()
        .filter(|r| r.module_id == module_id)
        .or_else(|| p.flat.module_index(module_id).and_then(|i| p.flat.first_lesson_of(i)))
}
