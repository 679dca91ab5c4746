//! Flattening of the content tree into course order.
//!
//! Modules, groups and lessons are ordered by their order index (ties keep
//! authoring order). The resulting lesson sequence is the single total order
//! every sequencing decision is based on.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use lessonpath_core::{CourseTree, Group, GroupId, Lesson, LessonId, LessonRef, Module, ModuleId};

/// A module in course order with the range of its lessons.
#[derive(Debug, Clone)]
pub struct FlatModule<'a> {
    /// The module
    pub module: &'a Module,
    /// Its reachable groups in order
    pub groups: Vec<FlatGroup<'a>>,
    /// Indices into [`Flattened::lessons`]
    pub lessons: Range<usize>,
}

/// A group in course order with the range of its lessons.
#[derive(Debug, Clone)]
pub struct FlatGroup<'a> {
    /// The group
    pub group: &'a Group,
    /// Indices into [`Flattened::lessons`]
    pub lessons: Range<usize>,
}

/// A lesson in course order.
#[derive(Debug, Clone)]
pub struct FlatLesson<'a> {
    /// The lesson
    pub lesson: &'a Lesson,
    /// Index into [`Flattened::modules`]
    pub module_index: usize,
    /// Full address of the lesson
    pub at: LessonRef,
}

/// The content tree flattened into course order.
///
/// Entries with dangling or mismatched parent references are left out.
#[derive(Debug, Clone)]
pub struct Flattened<'a> {
    /// Modules in course order
    pub modules: Vec<FlatModule<'a>>,
    /// Lessons in course order
    pub lessons: Vec<FlatLesson<'a>>,
    positions: HashMap<LessonId, usize>,
}

impl<'a> Flattened<'a> {
    /// Position of a lesson in course order.
    pub fn position(&self, lesson_id: LessonId) -> Option<usize> {
        self.positions.get(&lesson_id).copied()
    }

    /// Index of a module in course order.
    pub fn module_index(&self, module_id: ModuleId) -> Option<usize> {
        self.modules.iter().position(|m| m.module.id == module_id)
    }

    /// First lesson of a module, if it has any.
    pub fn first_lesson_of(&self, module_index: usize) -> Option<LessonRef> {
        let range = self.modules.get(module_index)?.lessons.clone();
        self.lessons.get(range).and_then(|l| l.first()).map(|l| l.at)
    }
}

/// Flatten a tree into course order.
pub fn flatten(tree: &CourseTree) -> Flattened<'_> {
    let modules_by_id: HashMap<ModuleId, &Module> = tree.modules.iter().map(|m| (m.id, m)).collect();
    let groups_by_id: HashMap<GroupId, &Group> = tree.groups.iter().map(|g| (g.id, g)).collect();
    let lessons_by_id: HashMap<LessonId, &Lesson> = tree.lessons.iter().map(|l| (l.id, l)).collect();

    let mut seen_modules = HashSet::new();
    let mut course_modules: Vec<&Module> = tree
        .course
        .modules
        .iter()
        .filter(|id| seen_modules.insert(**id))
        .filter_map(|id| modules_by_id.get(id).copied())
        .filter(|m| m.course_id == tree.course.id)
        .collect();
    course_modules.sort_by_key(|m| m.order);

    let mut seen_groups = HashSet::new();
    let mut seen_lessons = HashSet::new();
    let mut modules = Vec::with_capacity(course_modules.len());
    let mut lessons = Vec::with_capacity(tree.lessons.len());

    for module in course_modules {
        let module_index = modules.len();
        let module_start = lessons.len();

        let mut module_groups: Vec<&Group> = module
            .groups
            .iter()
            .filter(|id| seen_groups.insert(**id))
            .filter_map(|id| groups_by_id.get(id).copied())
            .filter(|g| g.module_id == module.id)
            .collect();
        module_groups.sort_by_key(|g| g.order);

        let mut groups = Vec::with_capacity(module_groups.len());
        for group in module_groups {
            let group_start = lessons.len();

            let mut group_lessons: Vec<&Lesson> = group
                .lessons
                .iter()
                .filter(|id| seen_lessons.insert(**id))
                .filter_map(|id| lessons_by_id.get(id).copied())
                .filter(|l| l.group_id == group.id)
                .collect();
            group_lessons.sort_by_key(|l| l.order);

            for lesson in group_lessons {
                lessons.push(FlatLesson {
                    lesson,
                    module_index,
                    at: LessonRef {
                        module_id: module.id,
                        group_id: group.id,
                        lesson_id: lesson.id,
                    },
                });
            }
            groups.push(FlatGroup { group, lessons: group_start..lessons.len() });
        }

        modules.push(FlatModule {
            module,
            groups,
            lessons: module_start..lessons.len(),
        });
    }

    let positions = lessons.iter().enumerate().map(|(i, l)| (l.lesson.id, i)).collect();
    Flattened { modules, lessons, positions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lessonpath_core::{CourseTreeBuilder, LessonKind};

    #[test]
    fn test_flatten_follows_order_indices() {
        let mut b = CourseTreeBuilder::new("c", "C");
        let m1 = b.module("One");
        let m2 = b.module("Two");
        let g1 = b.group(m1, "G1");
        let g2 = b.group(m2, "G2");
        let a = b.lesson(g1, "A", LessonKind::Video);
        let bb = b.lesson(g1, "B", LessonKind::Video);
        let c = b.lesson(g2, "C", LessonKind::Video);
        let mut tree = b.build();

        // Swap module order and lesson order within g1.
        tree.modules.iter_mut().find(|m| m.id == m1).unwrap().order = 30;
        tree.lessons.iter_mut().find(|l| l.id == a).unwrap().order = 99;

        let flat = flatten(&tree);
        let order: Vec<_> = flat.lessons.iter().map(|l| l.lesson.id).collect();
        assert_eq!(order, vec![c, bb, a]);
        assert_eq!(flat.modules[0].module.id, m2);
        assert_eq!(flat.modules[1].lessons, 1..3);
        assert_eq!(flat.position(a), Some(2));
        assert_eq!(flat.first_lesson_of(1).map(|r| r.lesson_id), Some(bb));
    }

    #[test]
    fn test_flatten_skips_dangling_entries() {
        let mut b = CourseTreeBuilder::new("c", "C");
        let m = b.module("M");
        let g = b.group(m, "G");
        let keep = b.lesson(g, "Keep", LessonKind::Article);
        let moved = b.lesson(g, "Moved", LessonKind::Article);
        let mut tree = b.build();
        tree.course.modules.push(ModuleId::new());
        tree.lessons.iter_mut().find(|l| l.id == moved).unwrap().group_id = GroupId::new();

        let flat = flatten(&tree);
        assert_eq!(flat.modules.len(), 1);
        assert_eq!(flat.lessons.len(), 1);
        assert_eq!(flat.lessons[0].lesson.id, keep);
        assert_eq!(flat.position(moved), None);
    }

    #[test]
    fn test_empty_module_has_empty_range() {
        let mut b = CourseTreeBuilder::new("c", "C");
        b.module("Empty");
        let tree = b.build();

        let flat = flatten(&tree);
        assert_eq!(flat.modules[0].lessons, 0..0);
        assert_eq!(flat.first_lesson_of(0), None);
    }
}
