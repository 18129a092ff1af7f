use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{profile::Profile, task::Task, time_entry::TimeEntry};

/// Current schema version
pub const CURRENT_VERSION: u32 = 2;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Store {
    pub version: u32,
    pub tasks: Vec<Task>,
    pub time_entries: Vec<TimeEntry>,
    pub profiles: Vec<Profile>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            tasks: vec![],
            time_entries: vec![],
            profiles: vec![],
        }
    }
}

impl Store {
    pub fn tasks_for<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a Task> {
        self.tasks.iter().filter(move |t| t.user_id == owner)
    }

    pub fn get_task_mut(&mut self, owner: &str, id: Uuid) -> Option<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id && t.user_id == owner)
    }

    /// Task numbers are never reused, even after deletion of the highest one.
    pub fn next_task_number(&self, owner: &str) -> u64 {
        self.tasks_for(owner)
            .map(|t| t.task_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn time_entries_for<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a TimeEntry> {
        self.time_entries.iter().filter(move |e| e.user_id == owner)
    }

    pub fn get_time_entry_mut(&mut self, owner: &str, id: Uuid) -> Option<&mut TimeEntry> {
        self.time_entries
            .iter_mut()
            .find(|e| e.id == id && e.user_id == owner)
    }

    pub fn get_profile(&self, owner: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.user_id == owner)
    }
}
