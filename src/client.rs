use jiff::Timestamp;
use uuid::Uuid;

use crate::{
    backend::{Backend, BackendError, NewTask, TaskUpdate},
    cache::{CachedRows, EntityKind, QueryCache, QueryKey},
    models::{
        profile::{Profile, ProfileSettings},
        task::{Task, TaskStatus},
        time_entry::TimeEntry,
    },
};

/// Backend access for a single owner. Reads go through a [`QueryCache`];
/// every write invalidates the kinds it touched.
pub struct Planner<B: Backend> {
    backend: B,
    cache: QueryCache,
    owner: String,
}

impl<B: Backend> Planner<B> {
    pub fn new(backend: B, owner: impl Into<String>) -> Self {
        Self {
            backend,
            cache: QueryCache::new(),
            owner: owner.into(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn key(&self, kind: EntityKind, filter: Option<String>) -> QueryKey {
        QueryKey::new(kind, self.owner.as_str(), filter)
    }

    pub fn tasks(&mut self, status: Option<TaskStatus>) -> Result<Vec<Task>, BackendError> {
        let key = self.key(EntityKind::Tasks, status.map(|s| format!("status={s}")));
        if let Some(CachedRows::Tasks(tasks)) = self.cache.get(&key) {
            return Ok(tasks.clone());
        }

        let tasks = self.backend.select_tasks(&self.owner, status)?;
        self.cache.insert(key, CachedRows::Tasks(tasks.clone()));
        Ok(tasks)
    }

    pub fn create_task(&mut self, task: NewTask) -> Result<Task, BackendError> {
        let created = self.backend.insert_task(&self.owner, task)?;
        self.cache.invalidate_kind(EntityKind::Tasks);
        Ok(created)
    }

    pub fn update_task(&mut self, id: Uuid, update: TaskUpdate) -> Result<Task, BackendError> {
        let updated = self.backend.update_task(&self.owner, id, update)?;
        self.cache.invalidate_kind(EntityKind::Tasks);
        Ok(updated)
    }

    pub fn delete_task(&mut self, id: Uuid) -> Result<Task, BackendError> {
        let deleted = self.backend.delete_task(&self.owner, id)?;
        self.cache.invalidate_kind(EntityKind::Tasks);
        self.cache.invalidate_kind(EntityKind::TimeEntries);
        Ok(deleted)
    }

    pub fn time_entries(&mut self, task_id: Option<Uuid>) -> Result<Vec<TimeEntry>, BackendError> {
        let key = self.key(EntityKind::TimeEntries, task_id.map(|id| format!("task={id}")));
        if let Some(CachedRows::TimeEntries(entries)) = self.cache.get(&key) {
            return Ok(entries.clone());
        }

        let entries = self.backend.select_time_entries(&self.owner, task_id)?;
        self.cache.insert(key, CachedRows::TimeEntries(entries.clone()));
        Ok(entries)
    }

    pub fn open_time_entry(
        &mut self,
        task_id: Uuid,
        start_time: Timestamp,
    ) -> Result<TimeEntry, BackendError> {
        let entry = self
            .backend
            .insert_time_entry(&self.owner, task_id, start_time)?;
        self.cache.invalidate_kind(EntityKind::TimeEntries);
        Ok(entry)
    }

    pub fn close_time_entry(
        &mut self,
        id: Uuid,
        end_time: Timestamp,
        duration_minutes: i64,
    ) -> Result<TimeEntry, BackendError> {
        let entry = self
            .backend
            .update_time_entry(&self.owner, id, end_time, duration_minutes)?;
        self.cache.invalidate_kind(EntityKind::TimeEntries);
        Ok(entry)
    }

    pub fn profile(&mut self) -> Result<Option<Profile>, BackendError> {
        let key = self.key(EntityKind::Profile, None);
        if let Some(CachedRows::Profile(profile)) = self.cache.get(&key) {
            return Ok(profile.clone());
        }

        let profile = self.backend.select_profile(&self.owner)?;
        self.cache.insert(key, CachedRows::Profile(profile.clone()));
        Ok(profile)
    }

    /// Profile with defaults applied for every missing field.
    pub fn settings(&mut self) -> Result<ProfileSettings, BackendError> {
        let profile = self.profile()?;
        Ok(ProfileSettings::resolve(profile.as_ref()))
    }

    pub fn save_profile(&mut self, profile: Profile) -> Result<Profile, BackendError> {
        let saved = self.backend.upsert_profile(&self.owner, profile)?;
        let key = self.key(EntityKind::Profile, None);
        self.cache.invalidate(&key);
        Ok(saved)
    }
}
