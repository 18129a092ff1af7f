use thiserror::Error;

use crate::models::task::Task;

pub mod export;
pub mod settings;
pub mod tasks;
pub mod timer;

#[derive(Debug, Error)]
pub enum TaskLookupError {
    #[error("Task '{0}' not found")]
    TaskNotFound(String),

    #[error("Task name is ambiguous. Multiple tasks found: {}", .0.join(", "))]
    AmbiguousTaskName(Vec<String>),
}

/// Resolves a task from a task number, or else from a fragment of its title
/// (case-insensitive) that matches exactly one task.
pub fn find_task<'a>(
    tasks: &'a [Task],
    task_number_or_fuzzy_name: &str,
) -> Result<&'a Task, TaskLookupError> {
    let trimmed = task_number_or_fuzzy_name.trim();
    if let Ok(task_number) = trimmed.trim_start_matches('#').parse::<u64>() {
        return tasks
            .iter()
            .find(|t| t.task_number == task_number)
            .ok_or_else(|| TaskLookupError::TaskNotFound(trimmed.to_string()));
    }

    let needle = trimmed.to_lowercase();
    let matching_tasks: Vec<_> = tasks
        .iter()
        .filter(|t| t.title.to_lowercase().contains(&needle))
        .collect();

    match matching_tasks.len() {
        0 => Err(TaskLookupError::TaskNotFound(trimmed.to_string())),
        1 => Ok(matching_tasks[0]),
        _ => {
            // An exact title match wins over partial ones
            if let Some(exact) = matching_tasks
                .iter()
                .find(|t| t.title.to_lowercase() == needle)
            {
                return Ok(*exact);
            }
            let titles: Vec<String> = matching_tasks.iter().map(|t| t.title.clone()).collect();
            Err(TaskLookupError::AmbiguousTaskName(titles))
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use tempfile::TempDir;

    use crate::{backend::StoreBackend, client::Planner, storage::json::JsonFileStorage};

    pub type TestPlanner = Planner<StoreBackend<JsonFileStorage>>;

    pub fn planner() -> (TempDir, TestPlanner) {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("store.json"));
        let planner = Planner::new(StoreBackend::open(storage).unwrap(), "local");
        (dir, planner)
    }
}
