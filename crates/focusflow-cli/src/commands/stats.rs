use chrono::{Local, Utc};
use clap::Subcommand;
use focusflow_core::timer::format_time;
use focusflow_core::Config;
use serde_json::json;

use super::{open_stores, print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// All-time stats
    All,
    /// Daily streak and total time studied
    Streak,
    /// Recent finished sessions
    Sessions {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

pub fn run(ctx: &Context, action: StatsAction) -> CliResult {
    let config = Config::load()?;
    let user_id = ctx.user_id(&config);
    let (db, _store) = open_stores()?;

    match action {
        StatsAction::Today => {
            let stats = db.stats(&user_id, Utc::now())?;
            print_json(&json!({
                "sessions": stats.today_sessions,
                "focus_min": stats.today_focus_min,
            }))?;
        }
        StatsAction::All => {
            let stats = db.stats(&user_id, Utc::now())?;
            print_json(&stats)?;
        }
        StatsAction::Streak => {
            let profile = db.get_or_create_profile(&user_id, config.user.name.as_deref())?;
            let today = Local::now().date_naive();
            let streak = profile.streak.current(today);
            let hours = profile.time_studied_secs / 3600;
            let rest = profile.time_studied_secs % 3600;
            println!(
                "Streak: {streak} day{}. Time studied: {hours}h {}",
                if streak == 1 { "" } else { "s" },
                format_time(rest)
            );
            print_json(&json!({
                "user_id": profile.user_id,
                "streak": streak,
                "last_update": profile.streak.last_update,
                "time_studied_secs": profile.time_studied_secs,
            }))?;
        }
        StatsAction::Sessions { limit } => {
            let sessions: Vec<_> = db.list_sessions(&user_id)?.into_iter().take(limit).collect();
            print_json(&sessions)?;
        }
    }
    Ok(())
}
