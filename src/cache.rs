//! Read-through cache for backend query results.
//!
//! Entries are keyed by `(entity kind, owner, filter)`. Writes drop either a
//! single key or every key of a kind, whatever the owner and filter.

use std::collections::HashMap;
use std::fmt;

use crate::models::{profile::Profile, task::Task, time_entry::TimeEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Tasks,
    TimeEntries,
    Profile,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Tasks => "tasks",
            EntityKind::TimeEntries => "time_entries",
            EntityKind::Profile => "profile",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub kind: EntityKind,
    pub owner: String,
    /// Rendered filter parameters, `None` for an unfiltered query
    pub filter: Option<String>,
}

impl QueryKey {
    pub fn new(kind: EntityKind, owner: impl Into<String>, filter: Option<String>) -> Self {
        Self {
            kind,
            owner: owner.into(),
            filter,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.owner)?;
        if let Some(filter) = &self.filter {
            write!(f, "/{filter}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CachedRows {
    Tasks(Vec<Task>),
    TimeEntries(Vec<TimeEntry>),
    Profile(Option<Profile>),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CachedRows>,
    stats: CacheStats,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: &QueryKey) -> Option<&CachedRows> {
        match self.entries.get(key) {
            Some(rows) => {
                self.stats.hits += 1;
                tracing::debug!(%key, "cache hit");
                Some(rows)
            }
            None => {
                self.stats.misses += 1;
                tracing::debug!(%key, "cache miss");
                None
            }
        }
    }

    pub fn insert(&mut self, key: QueryKey, rows: CachedRows) {
        self.entries.insert(key, rows);
    }

    /// Drops one exact key. Returns whether it was cached.
    pub fn invalidate(&mut self, key: &QueryKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            tracing::debug!(%key, "cache entry invalidated");
        }
        removed
    }

    /// Drops every key of `kind`. Returns how many entries went away.
    pub fn invalidate_kind(&mut self, kind: EntityKind) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.kind != kind);
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!(%kind, removed, "cache kind invalidated");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks_key(owner: &str, filter: Option<&str>) -> QueryKey {
        QueryKey::new(EntityKind::Tasks, owner, filter.map(String::from))
    }

    #[test]
    fn test_get_counts_hits_and_misses() {
        let mut cache = QueryCache::new();
        let key = tasks_key("ana", None);

        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), CachedRows::Tasks(vec![]));
        assert_eq!(cache.get(&key), Some(&CachedRows::Tasks(vec![])));

        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_filters_and_owners_are_distinct_keys() {
        let mut cache = QueryCache::new();
        cache.insert(tasks_key("ana", None), CachedRows::Tasks(vec![]));

        assert!(cache.get(&tasks_key("ana", Some("completed"))).is_none());
        assert!(cache.get(&tasks_key("ben", None)).is_none());
    }

    #[test]
    fn test_invalidate_exact_key_only() {
        let mut cache = QueryCache::new();
        cache.insert(tasks_key("ana", None), CachedRows::Tasks(vec![]));
        cache.insert(tasks_key("ana", Some("completed")), CachedRows::Tasks(vec![]));

        assert!(cache.invalidate(&tasks_key("ana", None)));
        assert!(!cache.invalidate(&tasks_key("ana", None)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_kind_spares_other_kinds() {
        let mut cache = QueryCache::new();
        cache.insert(tasks_key("ana", None), CachedRows::Tasks(vec![]));
        cache.insert(tasks_key("ben", Some("pending")), CachedRows::Tasks(vec![]));
        cache.insert(
            QueryKey::new(EntityKind::Profile, "ana", None),
            CachedRows::Profile(None),
        );

        assert_eq!(cache.invalidate_kind(EntityKind::Tasks), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.invalidate_kind(EntityKind::TimeEntries), 0);
        assert!(!cache.is_empty());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(tasks_key("ana", None).to_string(), "tasks/ana");
        assert_eq!(
            QueryKey::new(EntityKind::TimeEntries, "ana", Some(String::from("task=1"))).to_string(),
            "time_entries/ana/task=1"
        );
    }
}
