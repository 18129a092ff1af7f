use jiff::Timestamp;
use jiff::civil::Date;
use thiserror::Error;

use crate::{
    backend::{Backend, BackendError, NewTask, TaskUpdate},
    client::Planner,
    models::task::{Task, TaskStatus, parse_due_date},
    priority::{ScoreError, compute_priority_score},
    services::{TaskLookupError, find_task},
};

#[derive(Debug, Error)]
pub enum AddTaskError {
    #[error("Title is required")]
    EmptyTitle,

    #[error("Estimated duration must be a positive number of minutes")]
    InvalidEstimate,

    #[error("Invalid due date '{0}': {1}")]
    InvalidDueDate(String, String),

    #[error("{0}")]
    Score(#[from] ScoreError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

pub struct AddTaskParameters {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub estimated_minutes: u32,
    pub urgency: u8,
    pub difficulty: u8,
    pub grade_weight: u8,
    /// Anchor for relative due dates such as "tomorrow"
    pub today: Date,
}

fn parse_optional_due_date(input: Option<String>, today: Date) -> Result<Option<Date>, (String, String)> {
    match input {
        Some(raw) => parse_due_date(&raw, today)
            .map(Some)
            .map_err(|e| (raw, e.to_string())),
        None => Ok(None),
    }
}

pub fn add_task<B: Backend>(
    planner: &mut Planner<B>,
    parameters: AddTaskParameters,
) -> Result<Task, AddTaskError> {
    let title = parameters.title.trim().to_string();
    if title.is_empty() {
        return Err(AddTaskError::EmptyTitle);
    }

    if parameters.estimated_minutes == 0 {
        return Err(AddTaskError::InvalidEstimate);
    }

    let due_date = parse_optional_due_date(parameters.due_date, parameters.today)
        .map_err(|(raw, reason)| AddTaskError::InvalidDueDate(raw, reason))?;

    let weights = planner.settings()?.weights;
    let priority_score = compute_priority_score(
        parameters.urgency,
        parameters.grade_weight,
        parameters.difficulty,
        &weights,
    )?;

    let task = planner.create_task(NewTask {
        title,
        description: parameters.description.filter(|d| !d.trim().is_empty()),
        due_date,
        estimated_minutes: parameters.estimated_minutes,
        urgency: parameters.urgency,
        difficulty: parameters.difficulty,
        grade_weight: parameters.grade_weight,
        priority_score: Some(priority_score),
    })?;

    tracing::info!(number = task.task_number, priority_score, "task added");
    Ok(task)
}

#[derive(Debug, Error)]
pub enum EditTaskError {
    #[error(transparent)]
    Lookup(#[from] TaskLookupError),

    #[error("Nothing to change")]
    NothingToChange,

    #[error("Title is required")]
    EmptyTitle,

    #[error("Estimated duration must be a positive number of minutes")]
    InvalidEstimate,

    #[error("Invalid due date '{0}': {1}")]
    InvalidDueDate(String, String),

    #[error("{0}")]
    Score(#[from] ScoreError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Default)]
pub struct EditTaskParameters {
    pub task_number_or_fuzzy_name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub clear_description: bool,
    pub due_date: Option<String>,
    pub clear_due_date: bool,
    pub estimated_minutes: Option<u32>,
    pub urgency: Option<u8>,
    pub difficulty: Option<u8>,
    pub grade_weight: Option<u8>,
    pub today: Date,
}

impl EditTaskParameters {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && !self.clear_description
            && self.due_date.is_none()
            && !self.clear_due_date
            && self.estimated_minutes.is_none()
            && self.urgency.is_none()
            && self.difficulty.is_none()
            && self.grade_weight.is_none()
    }
}

/// Edits a task and recomputes its priority score with the current weights.
pub fn edit_task<B: Backend>(
    planner: &mut Planner<B>,
    parameters: EditTaskParameters,
) -> Result<Task, EditTaskError> {
    if parameters.is_empty() {
        return Err(EditTaskError::NothingToChange);
    }

    let tasks = planner.tasks(None)?;
    let task = find_task(&tasks, &parameters.task_number_or_fuzzy_name)?;

    let title = match parameters.title {
        Some(title) if title.trim().is_empty() => return Err(EditTaskError::EmptyTitle),
        Some(title) => Some(title.trim().to_string()),
        None => None,
    };

    if parameters.estimated_minutes == Some(0) {
        return Err(EditTaskError::InvalidEstimate);
    }

    let due_date = if parameters.clear_due_date {
        Some(None)
    } else {
        parse_optional_due_date(parameters.due_date, parameters.today)
            .map_err(|(raw, reason)| EditTaskError::InvalidDueDate(raw, reason))?
            .map(Some)
    };

    let description = if parameters.clear_description {
        Some(None)
    } else {
        parameters.description.map(Some)
    };

    let urgency = parameters.urgency.unwrap_or(task.urgency);
    let difficulty = parameters.difficulty.unwrap_or(task.difficulty);
    let grade_weight = parameters.grade_weight.unwrap_or(task.grade_weight);
    let weights = planner.settings()?.weights;
    let priority_score = compute_priority_score(urgency, grade_weight, difficulty, &weights)?;

    let task_id = task.id;
    let updated = planner.update_task(
        task_id,
        TaskUpdate {
            title,
            description,
            due_date,
            estimated_minutes: parameters.estimated_minutes,
            urgency: Some(urgency),
            difficulty: Some(difficulty),
            grade_weight: Some(grade_weight),
            priority_score: Some(Some(priority_score)),
            ..TaskUpdate::default()
        },
    )?;

    tracing::info!(number = updated.task_number, priority_score, "task edited");
    Ok(updated)
}

#[derive(Debug, Error)]
pub enum ChangeStatusError {
    #[error(transparent)]
    Lookup(#[from] TaskLookupError),

    #[error("Task '{title}' is already {status}")]
    StatusUnchanged { title: String, status: TaskStatus },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

pub struct ChangeStatusParameters {
    pub task_number_or_fuzzy_name: String,
    pub status: TaskStatus,
    pub at: Timestamp,
}

/// Moves a task to another status, stamping `completed_at` when it becomes
/// completed and clearing it otherwise.
pub fn change_status<B: Backend>(
    planner: &mut Planner<B>,
    parameters: ChangeStatusParameters,
) -> Result<Task, ChangeStatusError> {
    let tasks = planner.tasks(None)?;
    let task = find_task(&tasks, &parameters.task_number_or_fuzzy_name)?;

    if task.status == parameters.status {
        return Err(ChangeStatusError::StatusUnchanged {
            title: task.title.clone(),
            status: task.status,
        });
    }

    let completed_at = task.completion_for(parameters.status, parameters.at);
    let updated = planner.update_task(
        task.id,
        TaskUpdate {
            status: Some(parameters.status),
            completed_at: Some(completed_at),
            ..TaskUpdate::default()
        },
    )?;

    tracing::info!(number = updated.task_number, status = %updated.status, "task status changed");
    Ok(updated)
}

#[derive(Debug, Error)]
pub enum DeleteTaskError {
    #[error(transparent)]
    Lookup(#[from] TaskLookupError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

pub struct DeleteTaskParameters {
    pub task_number_or_fuzzy_name: String,
}

pub fn delete_task<B: Backend>(
    planner: &mut Planner<B>,
    parameters: DeleteTaskParameters,
) -> Result<Task, DeleteTaskError> {
    let tasks = planner.tasks(None)?;
    let task = find_task(&tasks, &parameters.task_number_or_fuzzy_name)?;

    let deleted = planner.delete_task(task.id)?;
    tracing::info!(number = deleted.task_number, "task deleted");
    Ok(deleted)
}
