//! Half-hour calendar grid for a single day.

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use serde::Serialize;

use crate::schedule::{generate_time_blocks, ScheduleConfig, TimeBlock, ViewMode};
use crate::task::Task;

pub const SLOTS_PER_DAY: usize = 48;

/// `00:00`, `00:30`, … `23:30`.
pub fn time_slots() -> Vec<NaiveTime> {
    (0..SLOTS_PER_DAY as u32)
        .filter_map(|i| NaiveTime::from_hms_opt(i / 2, (i % 2) * 30, 0))
        .collect()
}

/// Tasks due on `date` at exactly the slot's hour and minute.
pub fn tasks_for_slot<'a>(tasks: &'a [Task], date: NaiveDate, slot: NaiveTime) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| {
            t.due_date.is_some_and(|due| {
                due.date() == date && due.hour() == slot.hour() && due.minute() == slot.minute()
            })
        })
        .collect()
}

/// 12-hour clock text, e.g. `9:30 AM`.
pub fn format_slot(slot: NaiveTime) -> String {
    slot.format("%-I:%M %p").to_string()
}

pub fn previous_day(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}

pub fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotView {
    pub time: NaiveTime,
    pub label: String,
    pub due: Vec<Task>,
}

/// One date's slots with their due tasks and the generated schedule.
#[derive(Debug, Clone, Serialize)]
pub struct DayView {
    pub date: NaiveDate,
    pub slots: Vec<SlotView>,
    pub blocks: Vec<TimeBlock>,
}

impl DayView {
    pub fn build(tasks: &[Task], date: NaiveDate, config: &ScheduleConfig) -> Self {
        let slots = time_slots()
            .into_iter()
            .map(|time| SlotView {
                time,
                label: format_slot(time),
                due: tasks_for_slot(tasks, date, time).into_iter().cloned().collect(),
            })
            .collect();
        Self {
            date,
            slots,
            blocks: generate_time_blocks(tasks, date, ViewMode::Daily, config),
        }
    }

    /// Heading text, e.g. `March 4, 2025`.
    pub fn title(&self) -> String {
        self.date.format("%B %-d, %Y").to_string()
    }

    /// Slots with at least one due task.
    pub fn busy_slots(&self) -> impl Iterator<Item = &SlotView> {
        self.slots.iter().filter(|s| !s.due.is_empty())
    }

    /// Blocks overlapping the half hour starting at `slot`.
    pub fn blocks_in_slot(&self, slot: NaiveTime) -> Vec<&TimeBlock> {
        let start = self.date.and_time(slot);
        let end = start + Duration::minutes(30);
        self.blocks
            .iter()
            .filter(|b| b.start_time < end && b.end_time > start)
            .collect()
    }
}
