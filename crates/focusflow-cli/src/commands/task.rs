//! Task management commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use focusflow_core::task::{parse_due_date, parse_tags};
use focusflow_core::{
    Config, NewTask, ProgressOutcome, Task, TagKind, TaskRepository, TaskSet, ValidationError,
};

use super::{open_stores, print_json, purge_expired, CliResult, Context};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add {
        /// Task name
        name: String,
        /// Estimated hours of work (each hour is two focus sessions)
        #[arg(long)]
        hours: f64,
        /// Due date, e.g. 2025-03-04T17:00
        #[arg(long)]
        due: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// List tasks
    List {
        /// Which set to list: active, completed or deleted
        #[arg(long, default_value = "active")]
        set: TaskSet,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one task as JSON
    Show {
        /// Task ID
        id: String,
        #[arg(long, default_value = "active")]
        set: TaskSet,
    },
    /// Edit an active task
    Edit {
        /// Task ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        hours: Option<f64>,
        /// New due date, or "none" to clear it
        #[arg(long)]
        due: Option<String>,
        /// Comma-separated tags (replaces existing tags)
        #[arg(long)]
        tags: Option<String>,
    },
    /// Record one finished focus session against a task
    Progress {
        /// Task ID
        id: String,
    },
    /// Move a task to the deleted set
    Delete {
        /// Task ID
        id: String,
    },
    /// Bring a deleted task back
    Restore {
        /// Task ID
        id: String,
    },
    /// Permanently remove deleted tasks past the retention window
    Purge,
}

fn print_row(task: &Task) {
    let tags = task
        .tags
        .iter()
        .map(|t| format!("\x1b[{}m#{t}\x1b[0m", TagKind::classify(t).ansi_code()))
        .collect::<Vec<_>>()
        .join(" ");
    println!("{}  {:>3}%  {}  {}", task.id, task.progress_pct(), task.summary(), tags);
}

fn apply_edit(
    task: &mut Task,
    name: Option<String>,
    hours: Option<f64>,
    due: Option<String>,
    tags: Option<String>,
    sessions_per_hour: u32,
) -> Result<(), ValidationError> {
    if let Some(name) = name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        task.name = name;
    }
    if let Some(hours) = hours {
        task.re_estimate(hours, sessions_per_hour)?;
    }
    if let Some(due) = due {
        task.due_date = if due.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(parse_due_date(&due)?)
        };
    }
    if let Some(tags) = tags {
        task.tags = parse_tags(&tags);
    }
    Ok(())
}

pub fn run(ctx: &Context, action: TaskAction) -> CliResult {
    let config = Config::load()?;
    let user_id = ctx.user_id(&config);
    let (_db, store) = open_stores()?;
    purge_expired(&store, &config, &user_id)?;

    match action {
        TaskAction::Add {
            name,
            hours,
            due,
            tags,
        } => {
            let input = NewTask {
                name,
                duration_hours: hours,
                due_date: due.as_deref().map(parse_due_date).transpose()?,
                tags: tags.as_deref().map(parse_tags).unwrap_or_default(),
            };
            let task = Task::with_sessions_per_hour(
                input,
                user_id.as_str(),
                config.tasks.sessions_per_hour,
                Utc::now(),
            )?;
            store.create_task(&task)?;
            println!("Task created: {}", task.id);
            print_json(&task)?;
        }
        TaskAction::List { set, json } => {
            let tasks = store.list_tasks(&user_id, set)?;
            if json {
                print_json(&tasks)?;
            } else if tasks.is_empty() {
                println!("No tasks in {set}.");
            } else {
                for task in &tasks {
                    print_row(task);
                }
            }
        }
        TaskAction::Show { id, set } => {
            let task = store
                .get_task(&user_id, set, &id)?
                .ok_or_else(|| format!("Task not found in {set}: {id}"))?;
            print_json(&task)?;
        }
        TaskAction::Edit {
            id,
            name,
            hours,
            due,
            tags,
        } => {
            let mut task = store
                .get_task(&user_id, TaskSet::Active, &id)?
                .ok_or_else(|| format!("Task not found in {}: {id}", TaskSet::Active))?;
            apply_edit(&mut task, name, hours, due, tags, config.tasks.sessions_per_hour)?;
            store.update_task(&task)?;
            print_json(&task)?;
        }
        TaskAction::Progress { id } => match store.record_progress(&user_id, &id)? {
            ProgressOutcome::Progressed(task) => {
                println!(
                    "{}: {}/{} sessions",
                    task.name, task.completed_sessions, task.total_sessions
                );
            }
            ProgressOutcome::Completed(task) => {
                println!("Task completed: {}", task.name);
            }
        },
        TaskAction::Delete { id } => {
            let task = store.delete_task(&user_id, &id, Utc::now())?;
            println!(
                "Deleted '{}'. Restore within {} hours with `focusflow task restore {}`.",
                task.name, config.tasks.deleted_retention_hours, task.id
            );
        }
        TaskAction::Restore { id } => {
            let task = store.restore_task(&user_id, &id)?;
            println!("Restored '{}'.", task.name);
        }
        TaskAction::Purge => {
            let purged = purge_expired(&store, &config, &user_id)?;
            println!("Purged {purged} task(s).");
        }
    }
    Ok(())
}
