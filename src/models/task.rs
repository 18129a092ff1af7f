use std::{fmt, str::FromStr};

use jiff::Timestamp;
use jiff::ToSpan;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct Task {
    /// UUID to identify the task
    pub id: Uuid,
    /// Owner of the row
    pub user_id: String,
    /// User-facing auto-incremental task number, per owner
    pub task_number: u64,
    /// Title of the task
    pub title: String,
    /// Free-form description
    pub description: Option<String>,
    /// Calendar day the task is due on
    pub due_date: Option<Date>,
    pub status: TaskStatus,
    /// Estimated effort in minutes
    pub estimated_minutes: u32,
    /// Urgency rating on the 1-5 scale
    pub urgency: u8,
    /// Difficulty rating on the 1-5 scale
    pub difficulty: u8,
    /// How much the task weighs on the final grade, 1-5 scale
    pub grade_weight: u8,
    /// Weighted score in [0, 1], two decimals
    pub priority_score: Option<f64>,
    /// Set exactly while the status is completed
    pub completed_at: Option<Timestamp>,
    /// When the task was created
    pub created_at: Timestamp,
}

impl Task {
    pub fn is_open(&self) -> bool {
        self.status != TaskStatus::Completed
    }

    /// Missing scores rank like a zero score.
    pub fn priority_or_zero(&self) -> f64 {
        self.priority_score.unwrap_or(0.0)
    }

    /// Returns the `completed_at` value a task must carry after moving to `status`.
    pub fn completion_for(&self, status: TaskStatus, at: Timestamp) -> Option<Timestamp> {
        match status {
            TaskStatus::Completed => self.completed_at.or(Some(at)),
            TaskStatus::Pending | TaskStatus::InProgress => None,
        }
    }
}

#[derive(
    Serialize, Deserialize, Default, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown status '{0}' (expected pending, in-progress or completed)")]
pub struct ParseTaskStatusError(pub String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "pending" | "todo" => Ok(TaskStatus::Pending),
            "in-progress" | "inprogress" | "started" => Ok(TaskStatus::InProgress),
            "completed" | "done" => Ok(TaskStatus::Completed),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

/// Parses a due date given as `YYYY-MM-DD`, a full datetime (only the calendar
/// part is kept) or one of `today`, `tomorrow` and `yesterday`.
pub fn parse_due_date(input: &str, today: Date) -> Result<Date, jiff::Error> {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "today" => return Ok(today),
        "tomorrow" => return today.checked_add(1.day()),
        "yesterday" => return today.checked_sub(1.day()),
        _ => {}
    }

    let date_part = trimmed.split(['T', 't', ' ']).next().unwrap_or(trimmed);
    date_part.parse()
}
