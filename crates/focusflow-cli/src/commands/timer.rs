use std::io::Write;
use std::time::Duration as StdDuration;

use chrono::Utc;
use clap::Subcommand;
use focusflow_core::timer::format_time;
use focusflow_core::{
    CompletionReport, Config, Database, Event, FocusSession, Mood, Notice, SqliteTaskStore,
    TaskRepository, TaskSet, TimerEngine, TimerMode,
};

use super::{open_stores, print_json, CliResult, Context};

const ENGINE_KEY: &str = "timer_state";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print the timer state as JSON
    Status,
    /// Start the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Start if paused, pause if running
    Toggle,
    /// Refill the current mode and stop
    Reset,
    /// Switch to another mode (pomodoro, short-break, long-break)
    Mode {
        mode: TimerMode,
    },
    /// Set a mode's length in minutes
    Duration {
        mode: TimerMode,
        minutes: u32,
    },
    /// Attach an active task to focus sessions
    Select {
        /// Task ID; omit to clear the selection
        task_id: Option<String>,
    },
    /// Tune durations for your mood
    Mood {
        mood: Mood,
    },
    /// Apply seconds by hand
    Tick {
        #[arg(long, default_value = "1")]
        seconds: u32,
    },
    /// Run the countdown in the foreground until it finishes
    Watch,
}

fn engine_key(user_id: &str) -> String {
    format!("{ENGINE_KEY}:{user_id}")
}

fn load_engine(db: &Database, user_id: &str, config: &Config) -> Result<TimerEngine, Box<dyn std::error::Error>> {
    if let Some(json) = db.kv_get(&engine_key(user_id))? {
        match serde_json::from_str::<TimerEngine>(&json) {
            Ok(engine) => return Ok(engine),
            Err(e) => tracing::warn!(error = %e, "stored timer state is unreadable; starting fresh"),
        }
    }
    Ok(TimerEngine::new(config.durations()?))
}

fn save_engine(db: &Database, user_id: &str, engine: &TimerEngine) -> CliResult {
    let json = serde_json::to_string(engine)?;
    db.kv_set(&engine_key(user_id), &json)?;
    Ok(())
}

fn print_notice(notice: &Notice) {
    eprintln!("{} {}", notice.title, notice.body);
}

fn print_report(report: &CompletionReport) -> CliResult {
    for event in &report.events {
        print_json(event)?;
    }
    print_notice(&report.notice);
    Ok(())
}

fn print_event(event: Option<Event>, engine: &TimerEngine) -> CliResult {
    match event {
        Some(event) => print_json(&event),
        None => print_json(&engine.snapshot()),
    }
}

fn task_name(store: &SqliteTaskStore, user_id: &str, task_id: Option<&str>) -> Option<String> {
    let id = task_id?;
    store
        .get_task(user_id, TaskSet::Active, id)
        .ok()
        .flatten()
        .map(|t| t.name)
}

fn announce_start(store: &SqliteTaskStore, user_id: &str, engine: &TimerEngine, event: Option<&Event>) {
    match event {
        Some(Event::TimerStarted { .. }) => {
            let name = task_name(store, user_id, engine.selected_task());
            print_notice(&Notice::for_start(engine.mode(), name.as_deref()));
        }
        None if engine.remaining_secs() == 0 => {
            eprintln!("Countdown finished; run `focusflow timer reset` to go again.");
        }
        _ => {}
    }
}

/// Tick once per second until the countdown completes.
fn watch(session: &FocusSession<'_, SqliteTaskStore>, engine: &mut TimerEngine) -> CliResult {
    if !engine.is_active() && engine.start().is_none() {
        return Err("countdown already finished; run `focusflow timer reset` first".into());
    }
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let completed = rt.block_on(async {
        let mut interval = tokio::time::interval(StdDuration::from_secs(1));
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Some(event) = engine.catch_up(Utc::now()) {
                return event;
            }
            print!("\r{}", engine.title());
            let _ = std::io::stdout().flush();
        }
    });
    println!();
    let report = session.complete(engine, &completed)?;
    print_report(&report)
}

pub fn run(ctx: &Context, action: TimerAction) -> CliResult {
    let config = Config::load()?;
    let user_id = ctx.user_id(&config);
    let (db, store) = open_stores()?;
    let session = FocusSession::new(&db, &store, &user_id);
    let mut engine = load_engine(&db, &user_id, &config)?;

    // A completion may already be recorded when a later step fails, so the
    // engine is saved either way.
    let outcome = dispatch(action, &session, &store, &user_id, &mut engine);
    let saved = session
        .flush_time_studied(&mut engine)
        .map_err(Into::into)
        .and_then(|_| save_engine(&db, &user_id, &engine));
    outcome.and(saved)
}

fn dispatch(
    action: TimerAction,
    session: &FocusSession<'_, SqliteTaskStore>,
    store: &SqliteTaskStore,
    user_id: &str,
    engine: &mut TimerEngine,
) -> CliResult {
    // Account for time that passed since the last invocation.
    if let Some(report) = session.catch_up(engine, Utc::now())? {
        print_report(&report)?;
    }

    match action {
        TimerAction::Status => {
            println!("{}", engine.title());
            print_json(&engine.snapshot())?;
        }
        TimerAction::Start => {
            let event = engine.start();
            announce_start(store, user_id, engine, event.as_ref());
            print_event(event, engine)?;
        }
        TimerAction::Toggle => {
            let event = engine.toggle();
            announce_start(store, user_id, engine, event.as_ref());
            print_event(event, engine)?;
        }
        TimerAction::Pause => {
            let event = engine.pause();
            print_event(event, engine)?;
        }
        TimerAction::Reset => {
            let event = engine.reset();
            print_event(event, engine)?;
        }
        TimerAction::Mode { mode } => {
            let event = engine.switch_mode(mode);
            print_event(event, engine)?;
        }
        TimerAction::Duration { mode, minutes } => {
            let event = engine.set_duration(mode, minutes)?;
            print_json(&event)?;
        }
        TimerAction::Select { task_id } => {
            if let Some(id) = &task_id {
                store
                    .get_task(user_id, TaskSet::Active, id)?
                    .ok_or_else(|| format!("Task not found in {}: {id}", TaskSet::Active))?;
            }
            engine.select_task(task_id);
            print_json(&engine.snapshot())?;
        }
        TimerAction::Mood { mood } => {
            let mut durations = engine.durations();
            let advice = mood.apply(&mut durations);
            engine.set_durations(durations);
            println!("{advice}");
            println!(
                "Focus {} min, short break {} min, long break {} min",
                durations.pomodoro, durations.short_break, durations.long_break
            );
        }
        TimerAction::Tick { seconds } => {
            for _ in 0..seconds {
                if let Some(event) = engine.tick() {
                    let report = session.complete(engine, &event)?;
                    print_report(&report)?;
                    break;
                }
            }
            println!("{}", format_time(engine.remaining_secs()));
        }
        TimerAction::Watch => watch(session, engine)?,
    }
    Ok(())
}
