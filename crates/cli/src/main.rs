//! LessonPath CLI - course progression over a local JSON store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use lessonpath_core::{
    AnnotatedCourse, CourseId, CourseTree, LearnerContext, LearnerId, LessonId, LessonRef, LessonStatus,
    ModuleStatus, NavTarget,
};
use lessonpath_progress::{CourseProgression, EngineConfig, ProgressionService};
use lessonpath_storage::{CachedTreeProvider, ContentTreeProvider, JsonStorage};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type Service = ProgressionService<CachedTreeProvider<JsonStorage>, JsonStorage>;

#[derive(Parser)]
#[command(name = "lessonpath")]
#[command(about = "Course progression and unlock engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Storage path for course and progress data
    #[arg(short, long, default_value = ".lessonpath", global = true)]
    storage: PathBuf,

    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Learner ID
    #[arg(long, global = true)]
    learner: Option<String>,

    /// Course ID or slug
    #[arg(long, global = true)]
    course: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a course tree from a JSON file
    Import {
        /// Path to the course tree
        file: PathBuf,
    },
    /// Check a stored course tree for structural defects
    Validate,
    /// List stored courses
    Courses,
    /// Enroll a learner (a new learner ID is generated when none is given)
    Enroll,
    /// Show the course with the learner's progress
    Show,
    /// Mark a lesson completed
    Complete {
        /// Lesson ID
        lesson: String,
    },
    /// Open a lesson as the resume point
    Open {
        /// Lesson ID
        lesson: String,
    },
    /// Unlock the next module
    Unlock,
    /// Unlock the next module and jump to its first lesson
    Continue,
    /// Start the course over
    Reset,
    /// Show previous/next lessons
    Nav {
        /// Lesson ID
        lesson: String,
    },
    /// Print where the learner should pick up
    Resume,
    /// Remove the learner's progress for the course
    Unenroll,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: EngineConfig = serde_json::from_str(&content)
        .with_context(|| format!("parsing config {}", path.display()))?;
    debug!(?config, "loaded engine config");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref()).await?;
    let storage = Arc::new(JsonStorage::new(&cli.storage).await?);
    let trees = Arc::new(CachedTreeProvider::new(storage.clone(), config.tree_cache_ttl()));
    let service: Service = ProgressionService::new(trees, storage.clone()).with_config(config);

    match &cli.command {
        Commands::Import { file } => {
            let content = tokio::fs::read_to_string(file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let tree: CourseTree = serde_json::from_str(&content)?;
            let issues = tree.validate();
            for issue in &issues {
                warn!(course_id = %tree.course.id, %issue, "structural issue");
            }
            storage.save_course_tree(&tree).await?;
            info!(course_id = %tree.course.id, issues = issues.len(), "imported course");
            println!("Imported course: {} ({})", tree.course.id, tree.course.slug);
        }
        Commands::Validate => {
            let course_id = resolve_course(&storage, cli.course.as_deref()).await?;
            let tree = load_tree(&storage, course_id).await?;
            let issues = tree.validate();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&issues)?);
            } else if issues.is_empty() {
                println!("Course {} is consistent", tree.course.slug);
            } else {
                println!("Issues ({})", issues.len());
                for issue in issues {
                    println!("  {}", issue);
                }
            }
        }
        Commands::Courses => {
            let ids = storage.list_courses().await?;
            println!("Courses ({})", ids.len());
            for id in ids {
                let tree = load_tree(&storage, id).await?;
                println!("  {} | {} | {}", id, tree.course.slug, tree.course.title);
            }
        }
        Commands::Enroll => {
            let learner_id = match cli.learner.as_deref() {
                Some(s) => parse_learner(s)?,
                None => LearnerId::new(),
            };
            let course_id = resolve_course(&storage, cli.course.as_deref()).await?;
            let course = service.enroll(LearnerContext::new(learner_id, course_id)).await?;
            println!("Enrolled learner {} in {}", learner_id, course.slug);
            print_course(&course, cli.json)?;
        }
        Commands::Show => {
            let ctx = context(&cli, &storage).await?;
            print_course(&service.get_annotated_course(ctx).await?, cli.json)?;
        }
        Commands::Complete { lesson } => {
            let ctx = context(&cli, &storage).await?;
            let course = service.complete_lesson(ctx, parse_lesson(lesson)?).await?;
            print_course(&course, cli.json)?;
        }
        Commands::Open { lesson } => {
            let ctx = context(&cli, &storage).await?;
            let course = service.open_lesson(ctx, parse_lesson(lesson)?).await?;
            print_course(&course, cli.json)?;
        }
        Commands::Unlock => {
            let ctx = context(&cli, &storage).await?;
            print_course(&service.unlock_next_module(ctx).await?, cli.json)?;
        }
        Commands::Continue => {
            let ctx = context(&cli, &storage).await?;
            let (course, next) = service.continue_to_next_module(ctx).await?;
            print_course(&course, cli.json)?;
            if !cli.json {
                print_lesson_ref("Next lesson", next);
            }
        }
        Commands::Reset => {
            let ctx = context(&cli, &storage).await?;
            print_course(&service.reset_course(ctx).await?, cli.json)?;
        }
        Commands::Nav { lesson } => {
            let ctx = context(&cli, &storage).await?;
            let nav = service.get_navigation(ctx, parse_lesson(lesson)?).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&nav)?);
            } else {
                print_target("Previous", nav.previous);
                print_target("Next", nav.next);
            }
        }
        Commands::Resume => {
            let ctx = context(&cli, &storage).await?;
            let current = service.resume(ctx).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&current)?);
            } else {
                print_lesson_ref("Resume at", current);
            }
        }
        Commands::Unenroll => {
            let ctx = context(&cli, &storage).await?;
            service.unenroll(ctx).await?;
            println!("Unenrolled {}", ctx);
        }
    }

    Ok(())
}

async fn context(cli: &Cli, storage: &JsonStorage) -> Result<LearnerContext> {
    let learner = cli.learner.as_deref().ok_or_else(|| anyhow!("--learner is required"))?;
    let course_id = resolve_course(storage, cli.course.as_deref()).await?;
    Ok(LearnerContext::new(parse_learner(learner)?, course_id))
}

/// Accept either a course ID or the slug of a stored course.
async fn resolve_course(storage: &JsonStorage, course: Option<&str>) -> Result<CourseId> {
    let course = course.ok_or_else(|| anyhow!("--course is required"))?;
    if let Ok(id) = course.parse() {
        return Ok(id);
    }
    for id in storage.list_courses().await? {
        if load_tree(storage, id).await?.course.slug == course {
            return Ok(id);
        }
    }
    Err(anyhow!("Course not found: {}", course))
}

async fn load_tree(storage: &JsonStorage, id: CourseId) -> Result<CourseTree> {
    storage
        .get_course_tree(id)
        .await?
        .ok_or_else(|| anyhow!("Course not found: {}", id))
}

fn parse_learner(s: &str) -> Result<LearnerId> {
    s.parse().map_err(|_| anyhow!("Invalid learner ID: {}", s))
}

fn parse_lesson(s: &str) -> Result<LessonId> {
    s.parse().map_err(|_| anyhow!("Invalid lesson ID: {}", s))
}

fn print_course(course: &AnnotatedCourse, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(course)?);
        return Ok(());
    }

    println!("{} ({:.0}%)", course.title, course.progress * 100.0);
    for module in &course.modules {
        println!(
            "  [{}] {} {}/{}",
            format_module_status(module.status),
            module.title,
            module.completed_lessons,
            module.total_lessons,
        );
        for group in &module.groups {
            println!("    {}", group.title);
            for lesson in &group.lessons {
                let marker = if lesson.is_current { ">" } else { " " };
                let free = if lesson.is_free { " (free)" } else { "" };
                println!(
                    "    {} {} {} | {}{}",
                    marker,
                    format_lesson_status(lesson.status),
                    lesson.id,
                    lesson.title,
                    free,
                );
            }
        }
    }
    if course.can_unlock_next_module {
        println!("Next module can be unlocked");
    }
    if course.is_completed {
        println!("Course completed");
    }
    for issue in &course.issues {
        println!("  ! {}", issue);
    }
    Ok(())
}

fn print_lesson_ref(label: &str, lesson: Option<LessonRef>) {
    match lesson {
        Some(r) => println!("{}: {}", label, r.lesson_id),
        None => println!("{}: none", label),
    }
}

fn print_target(label: &str, target: Option<NavTarget>) {
    let Some(t) = target else {
        println!("{}: none", label);
        return;
    };
    let mut notes = Vec::new();
    if !t.actionable {
        notes.push("not actionable");
    }
    if t.requires_unlock {
        notes.push("requires unlock");
    }
    println!(
        "{}: {} [{}] {}",
        label,
        t.lesson.lesson_id,
        format_lesson_status(t.status),
        notes.join(", "),
    );
}

fn format_lesson_status(status: LessonStatus) -> &'static str {
    match status {
        LessonStatus::Locked => "LOCKED",
        LessonStatus::Unlocked => "OPEN",
        LessonStatus::Completed => "DONE",
    }
}

fn format_module_status(status: ModuleStatus) -> &'static str {
    match status {
        ModuleStatus::Locked => "LOCKED",
        ModuleStatus::Active => "ACTIVE",
        ModuleStatus::Completed => "DONE",
    }
}
