//! Structural validation of content trees.

use std::collections::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use crate::course::CourseTree;
use crate::id::{GroupId, LessonId, ModuleId};

/// A single structural defect in a content tree.
///
/// Defects never abort progression: affected entries are omitted from the
/// derived view and the defect is reported alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuralIssue {
    /// The course lists a module that does not exist
    #[error("course references missing module {module_id}")]
    MissingModule { module_id: ModuleId },

    /// A module lists a group that does not exist
    #[error("module {module_id} references missing group {group_id}")]
    MissingGroup { module_id: ModuleId, group_id: GroupId },

    /// A group lists a lesson that does not exist
    #[error("group {group_id} references missing lesson {lesson_id}")]
    MissingLesson { group_id: GroupId, lesson_id: LessonId },

    /// A module's back-reference points at another course
    #[error("module {module_id} does not belong to this course")]
    ModuleParentMismatch { module_id: ModuleId },

    /// A group's back-reference disagrees with the module listing it
    #[error("group {group_id} is listed by module {listed_by} but claims parent {claimed}")]
    GroupParentMismatch { group_id: GroupId, listed_by: ModuleId, claimed: ModuleId },

    /// A lesson's back-reference disagrees with the group listing it
    #[error("lesson {lesson_id} is listed by group {listed_by} but claims parent {claimed}")]
    LessonParentMismatch { lesson_id: LessonId, listed_by: GroupId, claimed: GroupId },

    /// A lesson that no group lists, or whose parent group is missing
    #[error("lesson {lesson_id} is not reachable from the course")]
    OrphanLesson { lesson_id: LessonId },

    /// The same entity is listed more than once
    #[error("entity {id} is listed more than once")]
    DuplicateEntry { id: String },

    /// Two siblings share an order index
    #[error("order index {order} is used more than once under {parent}")]
    DuplicateOrder { parent: String, order: i32 },
}

impl StructuralIssue {
    /// Lesson directly affected by this issue, if any.
    pub fn lesson_id(&self) -> Option<LessonId> {
        match self {
            StructuralIssue::MissingLesson { lesson_id, .. }
            | StructuralIssue::LessonParentMismatch { lesson_id, .. }
            | StructuralIssue::OrphanLesson { lesson_id } => Some(*lesson_id),
            _ => None,
        }
    }
}

impl CourseTree {
    /// Check the tree for structural defects.
    ///
    /// Returns an empty list for a well-formed tree.
    pub fn validate(&self) -> Vec<StructuralIssue> {
        let mut issues = Vec::new();
        let modules: HashMap<ModuleId, _> = self.modules.iter().map(|m| (m.id, m)).collect();
        let groups: HashMap<GroupId, _> = self.groups.iter().map(|g| (g.id, g)).collect();
        let lessons: HashMap<LessonId, _> = self.lessons.iter().map(|l| (l.id, l)).collect();

        let mut seen: HashSet<String> = HashSet::new();
        let mut reachable: HashSet<LessonId> = HashSet::new();

        let mut module_orders = Vec::new();
        for module_id in &self.course.modules {
            if !seen.insert(module_id.to_string()) {
                issues.push(StructuralIssue::DuplicateEntry { id: module_id.to_string() });
                continue;
            }
            let Some(module) = modules.get(module_id) else {
                issues.push(StructuralIssue::MissingModule { module_id: *module_id });
                continue;
            };
            if module.course_id != self.course.id {
                issues.push(StructuralIssue::ModuleParentMismatch { module_id: *module_id });
                continue;
            }
            module_orders.push(module.order);

            let mut group_orders = Vec::new();
            for group_id in &module.groups {
                if !seen.insert(group_id.to_string()) {
                    issues.push(StructuralIssue::DuplicateEntry { id: group_id.to_string() });
                    continue;
                }
                let Some(group) = groups.get(group_id) else {
                    issues.push(StructuralIssue::MissingGroup { module_id: module.id, group_id: *group_id });
                    continue;
                };
                if group.module_id != module.id {
                    issues.push(StructuralIssue::GroupParentMismatch {
                        group_id: *group_id,
                        listed_by: module.id,
                        claimed: group.module_id,
                    });
                    continue;
                }
                group_orders.push(group.order);

                let mut lesson_orders = Vec::new();
                for lesson_id in &group.lessons {
                    if !seen.insert(lesson_id.to_string()) {
                        issues.push(StructuralIssue::DuplicateEntry { id: lesson_id.to_string() });
                        continue;
                    }
                    let Some(lesson) = lessons.get(lesson_id) else {
                        issues.push(StructuralIssue::MissingLesson { group_id: group.id, lesson_id: *lesson_id });
                        continue;
                    };
                    if lesson.group_id != group.id {
                        issues.push(StructuralIssue::LessonParentMismatch {
                            lesson_id: *lesson_id,
                            listed_by: group.id,
                            claimed: lesson.group_id,
                        });
                        continue;
                    }
                    reachable.insert(*lesson_id);
                    lesson_orders.push(lesson.order);
                }
                check_orders(&mut issues, group.id.to_string(), lesson_orders);
            }
            check_orders(&mut issues, module.id.to_string(), group_orders);
        }
        check_orders(&mut issues, self.course.id.to_string(), module_orders);

        for lesson in &self.lessons {
            if !reachable.contains(&lesson.id) && !issues.iter().any(|i| i.lesson_id() == Some(lesson.id)) {
                issues.push(StructuralIssue::OrphanLesson { lesson_id: lesson.id });
            }
        }

        issues
    }
}

fn check_orders(issues: &mut Vec<StructuralIssue>, parent: String, mut orders: Vec<i32>) {
    orders.sort_unstable();
    for pair in orders.windows(2) {
        if pair[0] == pair[1] {
            issues.push(StructuralIssue::DuplicateOrder { parent: parent.clone(), order: pair[0] });
        }
    }
}
