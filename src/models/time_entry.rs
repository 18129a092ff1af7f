use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::views::compute_elapsed_minutes;

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct TimeEntry {
    pub id: Uuid,
    pub user_id: String,
    /// Task the time was spent on
    pub task_id: Uuid,
    pub start_time: Timestamp,
    /// Absent while the timer is still running
    pub end_time: Option<Timestamp>,
    /// Whole minutes, filled in when the entry is stopped
    pub duration_minutes: Option<i64>,
}

impl TimeEntry {
    pub fn is_running(&self) -> bool {
        self.end_time.is_none()
    }

    /// Elapsed minutes up to the end of the entry, or up to `now` while it runs.
    pub fn elapsed_minutes(&self, now: Timestamp) -> i64 {
        compute_elapsed_minutes(self.start_time, self.end_time.unwrap_or(now))
    }

    /// Recorded minutes, zero for entries that were never stopped.
    pub fn recorded_minutes(&self) -> i64 {
        self.duration_minutes.unwrap_or(0)
    }
}
