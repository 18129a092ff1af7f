//! Record-level request/response boundary for tasks, time entries and
//! profiles.
//!
//! Every call is scoped to an owner: rows belonging to someone else behave as
//! if they did not exist. [`StoreBackend`] serves the calls from a [`Store`]
//! and persists it through a [`Storage`] after every successful write.

use jiff::Timestamp;
use jiff::civil::Date;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{
        profile::Profile,
        store::Store,
        task::{Task, TaskStatus},
        time_entry::TimeEntry,
    },
    storage::{Storage, StorageError},
    views::sort_by_priority_descending,
};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Task {0} not found")]
    TaskNotFound(Uuid),

    #[error("Time entry {0} not found")]
    TimeEntryNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Fields supplied by the caller when inserting a task. The backend fills in
/// id, owner, task number and creation time.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<Date>,
    pub estimated_minutes: u32,
    pub urgency: u8,
    pub difficulty: u8,
    pub grade_weight: u8,
    pub priority_score: Option<f64>,
}

/// Partial update of a task row. `None` leaves a column untouched; nullable
/// columns take `Some(None)` to be cleared.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<Date>>,
    pub status: Option<TaskStatus>,
    pub completed_at: Option<Option<Timestamp>>,
    pub estimated_minutes: Option<u32>,
    pub urgency: Option<u8>,
    pub difficulty: Option<u8>,
    pub grade_weight: Option<u8>,
    pub priority_score: Option<Option<f64>>,
}

impl TaskUpdate {
    fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(completed_at) = self.completed_at {
            task.completed_at = completed_at;
        }
        if let Some(estimated_minutes) = self.estimated_minutes {
            task.estimated_minutes = estimated_minutes;
        }
        if let Some(urgency) = self.urgency {
            task.urgency = urgency;
        }
        if let Some(difficulty) = self.difficulty {
            task.difficulty = difficulty;
        }
        if let Some(grade_weight) = self.grade_weight {
            task.grade_weight = grade_weight;
        }
        if let Some(priority_score) = self.priority_score {
            task.priority_score = priority_score;
        }
    }
}

pub trait Backend {
    /// Tasks of `owner`, highest priority first.
    fn select_tasks(
        &self,
        owner: &str,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>, BackendError>;

    fn insert_task(&mut self, owner: &str, task: NewTask) -> Result<Task, BackendError>;

    fn update_task(
        &mut self,
        owner: &str,
        id: Uuid,
        update: TaskUpdate,
    ) -> Result<Task, BackendError>;

    /// Deletes the task together with its time entries.
    fn delete_task(&mut self, owner: &str, id: Uuid) -> Result<Task, BackendError>;

    /// Time entries of `owner`, most recent start first.
    fn select_time_entries(
        &self,
        owner: &str,
        task_id: Option<Uuid>,
    ) -> Result<Vec<TimeEntry>, BackendError>;

    fn insert_time_entry(
        &mut self,
        owner: &str,
        task_id: Uuid,
        start_time: Timestamp,
    ) -> Result<TimeEntry, BackendError>;

    fn update_time_entry(
        &mut self,
        owner: &str,
        id: Uuid,
        end_time: Timestamp,
        duration_minutes: i64,
    ) -> Result<TimeEntry, BackendError>;

    fn select_profile(&self, owner: &str) -> Result<Option<Profile>, BackendError>;

    fn upsert_profile(&mut self, owner: &str, profile: Profile) -> Result<Profile, BackendError>;
}

pub struct StoreBackend<S: Storage> {
    store: Store,
    storage: S,
}

impl<S: Storage> StoreBackend<S> {
    pub fn open(storage: S) -> Result<Self, StorageError> {
        let store = storage.load()?;
        Ok(Self { store, storage })
    }

    /// Applies `change` to a copy of the store and keeps the copy only once
    /// it has been saved, so a failed write leaves memory and file in step.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut Store) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        let mut next = self.store.clone();
        let value = change(&mut next)?;
        self.storage.save(&next)?;
        self.store = next;
        Ok(value)
    }
}

impl<S: Storage> Backend for StoreBackend<S> {
    fn select_tasks(
        &self,
        owner: &str,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>, BackendError> {
        let matching = self
            .store
            .tasks_for(owner)
            .filter(|t| status.is_none_or(|s| t.status == s));

        Ok(sort_by_priority_descending(matching)
            .into_iter()
            .cloned()
            .collect())
    }

    fn insert_task(&mut self, owner: &str, task: NewTask) -> Result<Task, BackendError> {
        let task = Task {
            id: Uuid::new_v4(),
            user_id: owner.to_string(),
            task_number: self.store.next_task_number(owner),
            title: task.title,
            description: task.description,
            due_date: task.due_date,
            status: TaskStatus::Pending,
            estimated_minutes: task.estimated_minutes,
            urgency: task.urgency,
            difficulty: task.difficulty,
            grade_weight: task.grade_weight,
            priority_score: task.priority_score,
            completed_at: None,
            created_at: Timestamp::now(),
        };

        self.commit(|store| {
            store.tasks.push(task.clone());
            Ok(())
        })?;
        tracing::info!(task_id = %task.id, number = task.task_number, "task inserted");
        Ok(task)
    }

    fn update_task(
        &mut self,
        owner: &str,
        id: Uuid,
        update: TaskUpdate,
    ) -> Result<Task, BackendError> {
        let updated = self.commit(|store| {
            let task = store
                .get_task_mut(owner, id)
                .ok_or(BackendError::TaskNotFound(id))?;
            update.apply(task);
            Ok(task.clone())
        })?;

        tracing::info!(task_id = %id, status = %updated.status, "task updated");
        Ok(updated)
    }

    fn delete_task(&mut self, owner: &str, id: Uuid) -> Result<Task, BackendError> {
        let (removed, removed_entries) = self.commit(|store| {
            let position = store
                .tasks
                .iter()
                .position(|t| t.id == id && t.user_id == owner)
                .ok_or(BackendError::TaskNotFound(id))?;
            let removed = store.tasks.remove(position);

            let entries_before = store.time_entries.len();
            store
                .time_entries
                .retain(|e| !(e.task_id == id && e.user_id == owner));
            Ok((removed, entries_before - store.time_entries.len()))
        })?;

        tracing::info!(task_id = %id, removed_entries, "task deleted");
        Ok(removed)
    }

    fn select_time_entries(
        &self,
        owner: &str,
        task_id: Option<Uuid>,
    ) -> Result<Vec<TimeEntry>, BackendError> {
        let mut entries: Vec<TimeEntry> = self
            .store
            .time_entries_for(owner)
            .filter(|e| task_id.is_none_or(|id| e.task_id == id))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(entries)
    }

    fn insert_time_entry(
        &mut self,
        owner: &str,
        task_id: Uuid,
        start_time: Timestamp,
    ) -> Result<TimeEntry, BackendError> {
        if !self.store.tasks_for(owner).any(|t| t.id == task_id) {
            return Err(BackendError::TaskNotFound(task_id));
        }

        let entry = TimeEntry {
            id: Uuid::new_v4(),
            user_id: owner.to_string(),
            task_id,
            start_time,
            end_time: None,
            duration_minutes: None,
        };

        self.commit(|store| {
            store.time_entries.push(entry.clone());
            Ok(())
        })?;
        tracing::info!(entry_id = %entry.id, %task_id, "time entry inserted");
        Ok(entry)
    }

    fn update_time_entry(
        &mut self,
        owner: &str,
        id: Uuid,
        end_time: Timestamp,
        duration_minutes: i64,
    ) -> Result<TimeEntry, BackendError> {
        let updated = self.commit(|store| {
            let entry = store
                .get_time_entry_mut(owner, id)
                .ok_or(BackendError::TimeEntryNotFound(id))?;
            entry.end_time = Some(end_time);
            entry.duration_minutes = Some(duration_minutes);
            Ok(entry.clone())
        })?;

        tracing::info!(entry_id = %id, duration_minutes, "time entry updated");
        Ok(updated)
    }

    fn select_profile(&self, owner: &str) -> Result<Option<Profile>, BackendError> {
        Ok(self.store.get_profile(owner).cloned())
    }

    fn upsert_profile(&mut self, owner: &str, profile: Profile) -> Result<Profile, BackendError> {
        let profile = Profile {
            user_id: owner.to_string(),
            ..profile
        };

        self.commit(|store| {
            match store.profiles.iter_mut().find(|p| p.user_id == owner) {
                Some(existing) => *existing = profile.clone(),
                None => store.profiles.push(profile.clone()),
            }
            Ok(())
        })?;

        tracing::info!(owner, "profile saved");
        Ok(profile)
    }
}
