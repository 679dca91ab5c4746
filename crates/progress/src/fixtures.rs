//! Course trees shared by the engine tests.

use lessonpath_core::{
    CompletionRecord, CourseTree, CourseTreeBuilder, LearnerContext, LearnerId, LessonId, LessonKind,
    ModuleId,
};

/// Module 1 with lessons 1.1 and 1.2, module 2 with lesson 2.1.
pub struct TwoModules {
    pub tree: CourseTree,
    pub m1: ModuleId,
    pub m2: ModuleId,
    pub l11: LessonId,
    pub l12: LessonId,
    pub l21: LessonId,
}

pub fn two_modules() -> TwoModules {
    let mut b = CourseTreeBuilder::new("two-modules", "Two Modules");
    let m1 = b.module("Module 1");
    let m2 = b.module("Module 2");
    let g1 = b.group(m1, "Group 1");
    let g2 = b.group(m2, "Group 2");
    let l11 = b.lesson(g1, "Lesson 1.1", LessonKind::Video);
    let l12 = b.lesson(g1, "Lesson 1.2", LessonKind::Quiz);
    let l21 = b.lesson(g2, "Lesson 2.1", LessonKind::Article);
    TwoModules { tree: b.build(), m1, m2, l11, l12, l21 }
}

/// Three modules over several groups, with a free lesson in module 3.
pub struct ThreeModules {
    pub tree: CourseTree,
    pub modules: [ModuleId; 3],
    /// Lessons in course order
    pub lessons: Vec<LessonId>,
    pub free: LessonId,
}

pub fn three_modules() -> ThreeModules {
    let mut b = CourseTreeBuilder::new("three-modules", "Three Modules");
    let m1 = b.module("Intro");
    let m2 = b.module("Core");
    let m3 = b.module("Advanced");

    let g11 = b.group(m1, "Welcome");
    let g12 = b.group(m1, "Setup");
    let g21 = b.group(m2, "Concepts");
    let g31 = b.group(m3, "Deep Dive");

    let mut lessons = vec![
        b.lesson(g11, "Welcome", LessonKind::Video),
        b.lesson(g12, "Install", LessonKind::Article),
        b.lesson(g12, "Check", LessonKind::Quiz),
        b.lesson(g21, "Ownership", LessonKind::Video),
        b.lesson(g21, "Borrowing", LessonKind::Project),
    ];
    let free = b.free_lesson(g31, "Preview", LessonKind::Video);
    lessons.push(free);
    lessons.push(b.lesson(g31, "Capstone", LessonKind::Project));

    ThreeModules { tree: b.build(), modules: [m1, m2, m3], lessons, free }
}

/// A fresh record for a new learner of `tree`.
pub fn record_for(tree: &CourseTree) -> CompletionRecord {
    let context = LearnerContext::new(LearnerId::new(), tree.course.id);
    crate::reset::fresh_record(tree, context, chrono::Utc::now())
}
