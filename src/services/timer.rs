use jiff::Timestamp;
use thiserror::Error;

use crate::{
    backend::{Backend, BackendError, TaskUpdate},
    client::Planner,
    models::{
        task::{Task, TaskStatus},
        time_entry::TimeEntry,
    },
    services::{TaskLookupError, find_task},
    views::{active_entry, compute_elapsed_minutes},
};

#[derive(Debug, Error)]
pub enum StartTimerError {
    #[error(transparent)]
    Lookup(#[from] TaskLookupError),

    #[error("A timer is already running for '{0}'")]
    TimerAlreadyRunning(String),

    #[error("Task '{0}' is already completed")]
    TaskAlreadyCompleted(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

pub struct StartTimerParameters {
    pub task_number_or_fuzzy_name: String,
    pub at: Timestamp,
}

/// Opens a time entry on a task. A pending task moves to in progress.
pub fn start_timer<B: Backend>(
    planner: &mut Planner<B>,
    parameters: StartTimerParameters,
) -> Result<(Task, TimeEntry), StartTimerError> {
    let tasks = planner.tasks(None)?;
    let entries = planner.time_entries(None)?;

    if let Some(running) = active_entry(&entries) {
        let title = tasks
            .iter()
            .find(|t| t.id == running.task_id)
            .map(|t| t.title.clone())
            .unwrap_or_else(|| running.task_id.to_string());
        return Err(StartTimerError::TimerAlreadyRunning(title));
    }

    let task = find_task(&tasks, &parameters.task_number_or_fuzzy_name)?;
    if task.status == TaskStatus::Completed {
        return Err(StartTimerError::TaskAlreadyCompleted(task.title.clone()));
    }

    let entry = planner.open_time_entry(task.id, parameters.at)?;
    let task = if task.status == TaskStatus::Pending {
        planner.update_task(
            task.id,
            TaskUpdate {
                status: Some(TaskStatus::InProgress),
                ..TaskUpdate::default()
            },
        )?
    } else {
        task.clone()
    };

    tracing::info!(number = task.task_number, entry = %entry.id, "timer started");
    Ok((task, entry))
}

#[derive(Debug, Error)]
pub enum StopTimerError {
    #[error("No timer is running")]
    NoTimerRunning,

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

pub struct StopTimerParameters {
    pub at: Timestamp,
}

/// Closes the running entry with its duration rounded to whole minutes.
pub fn stop_timer<B: Backend>(
    planner: &mut Planner<B>,
    parameters: StopTimerParameters,
) -> Result<TimeEntry, StopTimerError> {
    let entries = planner.time_entries(None)?;
    let running = active_entry(&entries).ok_or(StopTimerError::NoTimerRunning)?;

    let minutes = compute_elapsed_minutes(running.start_time, parameters.at);
    let entry = planner.close_time_entry(running.id, parameters.at, minutes)?;

    tracing::info!(entry = %entry.id, minutes, "timer stopped");
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;

    use crate::services::{
        tasks::{AddTaskParameters, ChangeStatusParameters, add_task, change_status},
        testing::{TestPlanner, planner},
    };

    fn at(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn add(planner: &mut TestPlanner, title: &str) -> Task {
        add_task(
            planner,
            AddTaskParameters {
                title: title.to_string(),
                description: None,
                due_date: None,
                estimated_minutes: 30,
                urgency: 2,
                difficulty: 4,
                grade_weight: 3,
                today: date(2024, 3, 5),
            },
        )
        .unwrap()
    }

    fn start(planner: &mut TestPlanner, reference: &str, when: &str) -> Result<(Task, TimeEntry), StartTimerError> {
        start_timer(
            planner,
            StartTimerParameters {
                task_number_or_fuzzy_name: reference.to_string(),
                at: at(when),
            },
        )
    }

    #[test]
    fn test_start_and_stop_records_rounded_duration() {
        let (_dir, mut planner) = planner();
        add(&mut planner, "essay");

        let (task, entry) = start(&mut planner, "essay", "2024-03-05T09:00:00Z").unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(entry.is_running());

        let stopped = stop_timer(
            &mut planner,
            StopTimerParameters {
                at: at("2024-03-05T09:25:30Z"),
            },
        )
        .unwrap();

        assert_eq!(stopped.id, entry.id);
        assert_eq!(stopped.end_time, Some(at("2024-03-05T09:25:30Z")));
        assert_eq!(stopped.duration_minutes, Some(26));
        assert!(active_entry(&planner.time_entries(None).unwrap()).is_none());
    }

    #[test]
    fn test_second_timer_is_rejected() {
        let (_dir, mut planner) = planner();
        add(&mut planner, "essay");
        add(&mut planner, "lab");

        start(&mut planner, "essay", "2024-03-05T09:00:00Z").unwrap();
        match start(&mut planner, "lab", "2024-03-05T09:05:00Z") {
            Err(StartTimerError::TimerAlreadyRunning(title)) => assert_eq!(title, "essay"),
            other => panic!("Expected TimerAlreadyRunning, got {other:?}"),
        }
        assert_eq!(planner.time_entries(None).unwrap().len(), 1);
    }

    #[test]
    fn test_cannot_time_completed_task() {
        let (_dir, mut planner) = planner();
        add(&mut planner, "essay");
        change_status(
            &mut planner,
            ChangeStatusParameters {
                task_number_or_fuzzy_name: String::from("1"),
                status: TaskStatus::Completed,
                at: at("2024-03-05T08:00:00Z"),
            },
        )
        .unwrap();

        assert!(matches!(
            start(&mut planner, "1", "2024-03-05T09:00:00Z"),
            Err(StartTimerError::TaskAlreadyCompleted(_))
        ));
    }

    #[test]
    fn test_stop_without_running_timer() {
        let (_dir, mut planner) = planner();
        assert!(matches!(
            stop_timer(
                &mut planner,
                StopTimerParameters {
                    at: at("2024-03-05T09:00:00Z")
                }
            ),
            Err(StopTimerError::NoTimerRunning)
        ));
    }

    #[test]
    fn test_stop_before_start_records_zero() {
        let (_dir, mut planner) = planner();
        add(&mut planner, "essay");
        start(&mut planner, "essay", "2024-03-05T09:00:00Z").unwrap();

        let stopped = stop_timer(
            &mut planner,
            StopTimerParameters {
                at: at("2024-03-05T08:59:00Z"),
            },
        )
        .unwrap();
        assert_eq!(stopped.duration_minutes, Some(0));
    }
}
