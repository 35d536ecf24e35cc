//! Derived focus/break schedule.
//!
//! Time blocks are computed from the active task list on every render and
//! never stored. Each day starts at `day_start` and lays out each unfinished
//! task's remaining sessions back to back, a focus block followed by a break.
//! A task stops being scheduled once its next focus block would end after
//! its due date.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Focus,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Daily,
    Weekly,
}

/// A scheduled slot on the calendar. Local wall-clock times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeBlock {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub task: Task,
    pub block_type: BlockType,
}

impl TimeBlock {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub day_start: NaiveTime,
    pub focus_minutes: u32,
    pub break_minutes: u32,
    pub week_start: Weekday,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            day_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            focus_minutes: 25,
            break_minutes: 5,
            week_start: Weekday::Sun,
        }
    }
}

/// The seven days of the week containing `date`.
pub fn week_days(date: NaiveDate, week_start: Weekday) -> Vec<NaiveDate> {
    let offset = (date.weekday().num_days_from_monday() + 7 - week_start.num_days_from_monday()) % 7;
    let first = date - Duration::days(i64::from(offset));
    first.iter_days().take(7).collect()
}

/// Lay out focus and break blocks for the selected day or week.
pub fn generate_time_blocks(
    tasks: &[Task],
    selected_date: NaiveDate,
    view_mode: ViewMode,
    config: &ScheduleConfig,
) -> Vec<TimeBlock> {
    let days = match view_mode {
        ViewMode::Daily => vec![selected_date],
        ViewMode::Weekly => week_days(selected_date, config.week_start),
    };
    let focus = Duration::minutes(i64::from(config.focus_minutes));
    let rest = Duration::minutes(i64::from(config.break_minutes));

    let mut blocks = Vec::new();
    for day in days {
        let mut cursor = day.and_time(config.day_start);
        for task in tasks.iter().filter(|t| !t.is_complete()) {
            for _ in 0..task.remaining_sessions() {
                let focus_end = cursor + focus;
                if task.due_date.is_some_and(|due| focus_end > due) {
                    break;
                }
                let break_end = focus_end + rest;
                blocks.push(TimeBlock {
                    start_time: cursor,
                    end_time: focus_end,
                    task: task.clone(),
                    block_type: BlockType::Focus,
                });
                blocks.push(TimeBlock {
                    start_time: focus_end,
                    end_time: break_end,
                    task: task.clone(),
                    block_type: BlockType::Break,
                });
                cursor = break_end;
            }
        }
    }
    tracing::debug!(blocks = blocks.len(), %selected_date, ?view_mode, "generated time blocks");
    blocks
}

/// True when `now` falls within the block, both ends inclusive.
pub fn is_current_block(block: &TimeBlock, now: NaiveDateTime) -> bool {
    block.start_time <= now && now <= block.end_time
}

/// The first block containing `now`.
pub fn block_at(blocks: &[TimeBlock], now: NaiveDateTime) -> Option<&TimeBlock> {
    blocks.iter().find(|b| is_current_block(b, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;
    use chrono::Utc;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(d: NaiveDate, h: u32, min: u32) -> NaiveDateTime {
        d.and_hms_opt(h, min, 0).unwrap()
    }

    fn task(name: &str, hours: f64, due: Option<NaiveDateTime>) -> Task {
        Task::new(
            NewTask {
                name: name.into(),
                duration_hours: hours,
                due_date: due,
                tags: vec![],
            },
            "u1",
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn single_task_alternates_focus_and_break() {
        let day = date(2025, 3, 4);
        let blocks = generate_time_blocks(
            &[task("Essay", 1.0, None)],
            day,
            ViewMode::Daily,
            &ScheduleConfig::default(),
        );
        let kinds: Vec<_> = blocks.iter().map(|b| b.block_type).collect();
        assert_eq!(
            kinds,
            vec![BlockType::Focus, BlockType::Break, BlockType::Focus, BlockType::Break]
        );
        assert_eq!(blocks[0].start_time, at(day, 8, 0));
        assert_eq!(blocks[0].end_time, at(day, 8, 25));
        assert_eq!(blocks[1].end_time, at(day, 8, 30));
        assert_eq!(blocks[2].start_time, at(day, 8, 30));
        assert_eq!(blocks[3].end_time, at(day, 9, 0));
    }

    #[test]
    fn tasks_follow_each_other_in_order() {
        let day = date(2025, 3, 4);
        let blocks = generate_time_blocks(
            &[task("A", 0.5, None), task("B", 0.5, None)],
            day,
            ViewMode::Daily,
            &ScheduleConfig::default(),
        );
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].task.name, "A");
        assert_eq!(blocks[2].task.name, "B");
        assert_eq!(blocks[2].start_time, at(day, 8, 30));
    }

    #[test]
    fn completed_sessions_are_not_rescheduled() {
        let mut t = task("Reading", 1.5, None);
        t.completed_sessions = 2;
        let mut done = task("Done", 0.5, None);
        done.completed_sessions = 1;
        let blocks = generate_time_blocks(
            &[done, t],
            date(2025, 3, 4),
            ViewMode::Daily,
            &ScheduleConfig::default(),
        );
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.task.name == "Reading"));
    }

    #[test]
    fn focus_blocks_never_end_after_due() {
        let day = date(2025, 3, 4);
        // Second session would end 08:55, past the 08:50 due time.
        let blocks = generate_time_blocks(
            &[task("Report", 2.0, Some(at(day, 8, 50)))],
            day,
            ViewMode::Daily,
            &ScheduleConfig::default(),
        );
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].end_time, at(day, 8, 25));
    }

    #[test]
    fn due_exactly_at_focus_end_is_allowed() {
        let day = date(2025, 3, 4);
        let blocks = generate_time_blocks(
            &[task("Quiz", 0.5, Some(at(day, 8, 25)))],
            day,
            ViewMode::Daily,
            &ScheduleConfig::default(),
        );
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn overdue_task_schedules_nothing() {
        let day = date(2025, 3, 4);
        let blocks = generate_time_blocks(
            &[task("Late", 1.0, Some(at(date(2025, 3, 1), 12, 0)))],
            day,
            ViewMode::Daily,
            &ScheduleConfig::default(),
        );
        assert!(blocks.is_empty());
    }

    #[test]
    fn weekly_view_restarts_each_day() {
        // Wednesday; the Sunday-start week runs Mar 2 through Mar 8.
        let blocks = generate_time_blocks(
            &[task("Gym", 0.5, None)],
            date(2025, 3, 5),
            ViewMode::Weekly,
            &ScheduleConfig::default(),
        );
        assert_eq!(blocks.len(), 14);
        assert_eq!(blocks[0].start_time, at(date(2025, 3, 2), 8, 0));
        assert_eq!(blocks[12].start_time, at(date(2025, 3, 8), 8, 0));
    }

    #[test]
    fn week_days_honours_week_start() {
        let wed = date(2025, 3, 5);
        assert_eq!(week_days(wed, Weekday::Sun)[0], date(2025, 3, 2));
        assert_eq!(week_days(wed, Weekday::Mon)[0], date(2025, 3, 3));
        assert_eq!(week_days(date(2025, 3, 2), Weekday::Sun)[0], date(2025, 3, 2));
        assert_eq!(week_days(wed, Weekday::Mon).len(), 7);
    }

    #[test]
    fn blocks_spill_past_midnight() {
        let config = ScheduleConfig {
            day_start: NaiveTime::from_hms_opt(23, 45, 0).unwrap(),
            ..ScheduleConfig::default()
        };
        let blocks = generate_time_blocks(
            &[task("Late night", 0.5, None)],
            date(2025, 3, 4),
            ViewMode::Daily,
            &config,
        );
        assert_eq!(blocks[0].end_time, at(date(2025, 3, 5), 0, 10));
    }

    #[test]
    fn current_block_is_inclusive() {
        let day = date(2025, 3, 4);
        let blocks = generate_time_blocks(
            &[task("Essay", 0.5, None)],
            day,
            ViewMode::Daily,
            &ScheduleConfig::default(),
        );
        assert!(is_current_block(&blocks[0], at(day, 8, 0)));
        assert!(is_current_block(&blocks[0], at(day, 8, 25)));
        assert!(!is_current_block(&blocks[0], at(day, 8, 26)));
        assert_eq!(block_at(&blocks, at(day, 8, 27)).map(|b| b.block_type), Some(BlockType::Break));
        assert!(block_at(&blocks, at(day, 7, 59)).is_none());
    }

    fn arb_tasks() -> impl Strategy<Value = Vec<(u32, u32, Option<i64>)>> {
        // (total sessions, completed, due offset in minutes from day start)
        prop::collection::vec((1u32..8, 0u32..8, prop::option::of(-60i64..600)), 0..6)
    }

    proptest! {
        #[test]
        fn schedule_invariants_hold(shapes in arb_tasks(), focus in 1u32..60, rest in 0u32..30) {
            let day = date(2025, 6, 10);
            let config = ScheduleConfig {
                focus_minutes: focus,
                break_minutes: rest,
                ..ScheduleConfig::default()
            };
            let start = day.and_time(config.day_start);
            let tasks: Vec<Task> = shapes
                .iter()
                .enumerate()
                .map(|(i, (total, done, due))| {
                    let mut t = task(&format!("t{i}"), f64::from(*total) / 2.0, due.map(|m| start + Duration::minutes(m)));
                    t.completed_sessions = (*done).min(*total);
                    t
                })
                .collect();

            let blocks = generate_time_blocks(&tasks, day, ViewMode::Daily, &config);

            prop_assert_eq!(blocks.len() % 2, 0);
            let mut cursor = start;
            for pair in blocks.chunks(2) {
                prop_assert_eq!(pair[0].block_type, BlockType::Focus);
                prop_assert_eq!(pair[1].block_type, BlockType::Break);
                prop_assert_eq!(pair[0].start_time, cursor);
                prop_assert_eq!(pair[0].end_time, pair[1].start_time);
                prop_assert_eq!(pair[0].duration_minutes(), i64::from(focus));
                prop_assert_eq!(pair[1].duration_minutes(), i64::from(rest));
                if let Some(due) = pair[0].task.due_date {
                    prop_assert!(pair[0].end_time <= due);
                }
                cursor = pair[1].end_time;
            }
            for t in &tasks {
                let scheduled = blocks
                    .iter()
                    .filter(|b| b.block_type == BlockType::Focus && b.task.id == t.id)
                    .count() as u32;
                prop_assert!(scheduled <= t.remaining_sessions());
            }
        }
    }
}
