//! Side effects of a finished countdown.
//!
//! The timer engine only reports `TimerCompleted`; this layer records the
//! session, credits studied time, moves the streak and advances the
//! selected task.

use chrono::{DateTime, Local, Utc};

use crate::error::{CoreError, Result, ValidationError};
use crate::events::Event;
use crate::storage::{Database, ProgressOutcome, TaskRepository};
use crate::timer::{Notice, StreakChange, TimerEngine};

/// Everything a completion produced, in order.
#[derive(Debug, Clone)]
pub struct CompletionReport {
    pub events: Vec<Event>,
    pub notice: Notice,
}

impl CompletionReport {
    pub fn completed_task(&self) -> Option<&str> {
        self.events.iter().find_map(|e| match e {
            Event::TaskCompleted { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }
}

pub struct FocusSession<'a, R: TaskRepository> {
    db: &'a Database,
    tasks: &'a R,
    user_id: &'a str,
}

impl<'a, R: TaskRepository> FocusSession<'a, R> {
    pub fn new(db: &'a Database, tasks: &'a R, user_id: &'a str) -> Self {
        Self { db, tasks, user_id }
    }

    /// Credit pending focus seconds to the profile. Returns the new total.
    pub fn flush_time_studied(&self, engine: &mut TimerEngine) -> Result<u64> {
        let pending = engine.take_time_studied();
        self.db.add_time_studied(self.user_id, pending)
    }

    /// Advance `engine` to `now` and apply the completion, if one happened.
    pub fn catch_up(
        &self,
        engine: &mut TimerEngine,
        now: DateTime<Utc>,
    ) -> Result<Option<CompletionReport>> {
        match engine.catch_up(now) {
            Some(event) => self.complete(engine, &event).map(Some),
            None => Ok(None),
        }
    }

    /// Apply a `TimerCompleted` event. Other events are ignored.
    pub fn complete(&self, engine: &mut TimerEngine, completed: &Event) -> Result<CompletionReport> {
        let Event::TimerCompleted {
            mode,
            duration_secs,
            task_id,
            started_at,
            at,
        } = completed
        else {
            return Ok(CompletionReport {
                events: Vec::new(),
                notice: Notice::for_completion(engine.mode(), engine.durations().short_break),
            });
        };

        let mut events = vec![completed.clone()];
        let notice = Notice::for_completion(*mode, engine.durations().short_break);

        self.db.record_session(
            self.user_id,
            *mode,
            task_id.as_deref(),
            *duration_secs,
            *started_at,
            *at,
        )?;
        self.flush_time_studied(engine)?;

        if !mode.is_focus() {
            return Ok(CompletionReport { events, notice });
        }

        let today = at.with_timezone(&Local).date_naive();
        let mut profile = self.db.get_or_create_profile(self.user_id, None)?;
        let change = profile.streak.record_focus_completion(today);
        if !matches!(change, StreakChange::Unchanged { .. }) {
            self.db.save_streak(self.user_id, &profile.streak)?;
            events.push(Event::StreakUpdated {
                streak: change.streak(),
                change,
                at: *at,
            });
        }

        if let Some(id) = task_id {
            match self.tasks.record_progress(self.user_id, id) {
                Ok(ProgressOutcome::Progressed(task)) => events.push(Event::TaskProgressed {
                    task_id: task.id,
                    name: task.name,
                    completed_sessions: task.completed_sessions,
                    total_sessions: task.total_sessions,
                    at: *at,
                }),
                Ok(ProgressOutcome::Completed(task)) => {
                    engine.select_task(None);
                    events.push(Event::TaskCompleted {
                        task_id: task.id,
                        name: task.name,
                        total_sessions: task.total_sessions,
                        at: *at,
                    });
                }
                Err(CoreError::NotFound { .. }) => {
                    tracing::warn!(task_id = %id, "selected task no longer active; clearing selection");
                    engine.select_task(None);
                }
                Err(CoreError::Validation(ValidationError::AlreadyComplete { .. })) => {
                    tracing::warn!(task_id = %id, "selected task has no sessions left; clearing selection");
                    engine.select_task(None);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(CompletionReport { events, notice })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteTaskStore;
    use crate::task::{NewTask, Task, TaskSet};
    use crate::timer::{Durations, TimerMode};
    use chrono::{Duration, TimeZone};

    fn fixture() -> (Database, SqliteTaskStore) {
        (Database::open_memory().unwrap(), SqliteTaskStore::open_memory().unwrap())
    }

    fn one_minute() -> TimerEngine {
        TimerEngine::new(Durations {
            pomodoro: 1,
            short_break: 1,
            long_break: 1,
        })
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()
    }

    fn add_task(store: &SqliteTaskStore, hours: f64) -> Task {
        let task = Task::new(
            NewTask {
                name: "Essay".into(),
                duration_hours: hours,
                ..Default::default()
            },
            "u1",
            noon(),
        )
        .unwrap();
        store.create_task(&task).unwrap();
        task
    }

    #[test]
    fn focus_completion_records_everything() {
        let (db, store) = fixture();
        let task = add_task(&store, 1.0);
        let session = FocusSession::new(&db, &store, "u1");

        let mut engine = one_minute();
        engine.select_task(Some(task.id.clone()));
        engine.start_at(noon());
        let report = session.catch_up(&mut engine, noon() + Duration::minutes(5)).unwrap().unwrap();

        assert_eq!(report.notice.title, "Break Time!");
        assert!(matches!(report.events[0], Event::TimerCompleted { .. }));
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e, Event::StreakUpdated { streak: 1, .. })));
        assert!(report.events.iter().any(|e| matches!(
            e,
            Event::TaskProgressed { completed_sessions: 1, total_sessions: 2, .. }
        )));

        let profile = db.get_or_create_profile("u1", None).unwrap();
        assert_eq!(profile.time_studied_secs, 60);
        assert_eq!(profile.streak.streak, 1);
        assert_eq!(db.list_sessions("u1").unwrap().len(), 1);
        assert_eq!(engine.selected_task(), Some(task.id.as_str()));
    }

    #[test]
    fn final_session_completes_task_and_clears_selection() {
        let (db, store) = fixture();
        let task = add_task(&store, 0.5);
        let session = FocusSession::new(&db, &store, "u1");

        let mut engine = one_minute();
        engine.select_task(Some(task.id.clone()));
        engine.start_at(noon());
        let report = session.catch_up(&mut engine, noon() + Duration::minutes(1)).unwrap().unwrap();

        assert_eq!(report.completed_task(), Some("Essay"));
        assert!(engine.selected_task().is_none());
        assert!(store.get_task("u1", TaskSet::Completed, &task.id).unwrap().is_some());
        assert!(store.list_tasks("u1", TaskSet::Active).unwrap().is_empty());
    }

    #[test]
    fn second_completion_same_day_keeps_streak() {
        let (db, store) = fixture();
        let session = FocusSession::new(&db, &store, "u1");
        let mut engine = one_minute();

        engine.start_at(noon());
        session.catch_up(&mut engine, noon() + Duration::minutes(1)).unwrap();
        engine.reset();
        engine.start_at(noon() + Duration::minutes(2));
        let report = session
            .catch_up(&mut engine, noon() + Duration::minutes(4))
            .unwrap()
            .unwrap();

        assert!(!report
            .events
            .iter()
            .any(|e| matches!(e, Event::StreakUpdated { .. })));
        assert_eq!(db.get_or_create_profile("u1", None).unwrap().streak.streak, 1);
        assert_eq!(db.get_or_create_profile("u1", None).unwrap().time_studied_secs, 120);
    }

    #[test]
    fn break_completion_only_records_session() {
        let (db, store) = fixture();
        let session = FocusSession::new(&db, &store, "u1");
        let mut engine = one_minute();
        engine.switch_mode(TimerMode::ShortBreak);
        engine.start_at(noon());
        let report = session.catch_up(&mut engine, noon() + Duration::minutes(1)).unwrap().unwrap();

        assert_eq!(report.events.len(), 1);
        assert_eq!(report.notice.title, "Break Over!");
        let profile = db.get_or_create_profile("u1", None).unwrap();
        assert_eq!(profile.streak.streak, 0);
        assert_eq!(profile.time_studied_secs, 0);
        assert_eq!(db.list_sessions("u1").unwrap()[0].mode, TimerMode::ShortBreak);
    }

    #[test]
    fn vanished_task_clears_selection() {
        let (db, store) = fixture();
        let task = add_task(&store, 1.0);
        store.delete_task("u1", &task.id, noon()).unwrap();
        let session = FocusSession::new(&db, &store, "u1");

        let mut engine = one_minute();
        engine.select_task(Some(task.id.clone()));
        engine.start_at(noon());
        session.catch_up(&mut engine, noon() + Duration::minutes(1)).unwrap();
        assert!(engine.selected_task().is_none());
    }

    #[test]
    fn exhausted_task_still_records_the_session() {
        let (db, store) = fixture();
        let mut task = add_task(&store, 1.0);
        task.completed_sessions = task.total_sessions;
        store.update_task(&task).unwrap();
        let session = FocusSession::new(&db, &store, "u1");

        let mut engine = one_minute();
        engine.select_task(Some(task.id.clone()));
        engine.start_at(noon());
        let report = session.catch_up(&mut engine, noon() + Duration::minutes(1)).unwrap().unwrap();

        assert!(engine.selected_task().is_none());
        assert!(report.completed_task().is_none());
        assert_eq!(db.list_sessions("u1").unwrap().len(), 1);
        assert_eq!(db.get_or_create_profile("u1", None).unwrap().streak.streak, 1);

        // Advancing again must not replay the completion.
        assert!(session.catch_up(&mut engine, noon() + Duration::minutes(2)).unwrap().is_none());
        assert_eq!(db.list_sessions("u1").unwrap().len(), 1);
    }

    #[test]
    fn no_completion_while_running() {
        let (db, store) = fixture();
        let session = FocusSession::new(&db, &store, "u1");
        let mut engine = TimerEngine::default();
        engine.start_at(noon());
        assert!(session.catch_up(&mut engine, noon() + Duration::minutes(3)).unwrap().is_none());
        assert_eq!(session.flush_time_studied(&mut engine).unwrap(), 180);
    }
}
