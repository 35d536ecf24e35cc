use chrono::{Local, NaiveDate};
use clap::Args;
use focusflow_core::calendar::{format_slot, next_day, previous_day};
use focusflow_core::schedule::is_current_block;
use focusflow_core::{
    generate_time_blocks, BlockType, Config, DayView, TaskRepository, TaskSet, TimeBlock, ViewMode,
};

use super::{open_stores, print_json, CliResult, Context};

#[derive(Args)]
pub struct CalendarArgs {
    /// Day to show (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Show the day before --date
    #[arg(long, conflicts_with = "next")]
    prev: bool,
    /// Show the day after --date
    #[arg(long)]
    next: bool,
    /// Show the whole week containing the date
    #[arg(long)]
    weekly: bool,
    /// Print every half-hour slot with tasks due in it
    #[arg(long, conflicts_with = "weekly")]
    slots: bool,
    /// Print JSON
    #[arg(long)]
    json: bool,
}

fn block_line(block: &TimeBlock, now: chrono::NaiveDateTime) -> String {
    let marker = if is_current_block(block, now) { ">" } else { " " };
    let kind = match block.block_type {
        BlockType::Focus => "Focus",
        BlockType::Break => "Break",
    };
    format!(
        "{marker} {:>8} - {:>8}  {kind:<5}  {}",
        format_slot(block.start_time.time()),
        format_slot(block.end_time.time()),
        block.task.name
    )
}

pub fn run(ctx: &Context, args: CalendarArgs) -> CliResult {
    let config = Config::load()?;
    let schedule = config.schedule_config()?;
    let user_id = ctx.user_id(&config);
    let (_db, store) = open_stores()?;
    let tasks = store.list_tasks(&user_id, TaskSet::Active)?;

    let now = Local::now().naive_local();
    let mut date = args.date.unwrap_or(now.date());
    if args.prev {
        date = previous_day(date);
    } else if args.next {
        date = next_day(date);
    }

    if args.weekly {
        let blocks = generate_time_blocks(&tasks, date, ViewMode::Weekly, &schedule);
        if args.json {
            return print_json(&blocks);
        }
        let mut current_day = None;
        for block in &blocks {
            let day = block.start_time.date();
            if current_day != Some(day) {
                println!("{}", day.format("%A, %B %-d"));
                current_day = Some(day);
            }
            println!("{}", block_line(block, now));
        }
        if blocks.is_empty() {
            println!("Nothing scheduled this week.");
        }
        return Ok(());
    }

    let view = DayView::build(&tasks, date, &schedule);
    if args.json {
        return print_json(&view);
    }

    println!("{}", view.title());
    if view.blocks.is_empty() {
        println!("Nothing scheduled.");
    }
    for block in &view.blocks {
        println!("{}", block_line(block, now));
    }

    if args.slots {
        println!();
        for slot in &view.slots {
            let due: Vec<&str> = slot.due.iter().map(|t| t.name.as_str()).collect();
            let busy = view.blocks_in_slot(slot.time).len();
            println!("{:>8} | {:<2} | {}", slot.label, busy, due.join(", "));
        }
    } else {
        for slot in view.busy_slots() {
            for task in &slot.due {
                println!("Due {}: {} ({} sessions left)", slot.label, task.name, task.remaining_sessions());
            }
        }
    }
    Ok(())
}
