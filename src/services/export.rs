use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::{
    backend::{Backend, BackendError},
    client::Planner,
    models::task::Task,
};

pub const CSV_HEADER: &str =
    "Title,Status,Due Date,Priority Score,Estimated Minutes,Urgency,Difficulty,Grade Weight";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// One header line plus one line per task, each ending in a newline.
pub fn render_csv(tasks: &[Task]) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');

    for task in tasks {
        let due_date = task.due_date.map(|d| d.to_string()).unwrap_or_default();
        let score = task.priority_score.map(|s| s.to_string()).unwrap_or_default();
        let row = [
            quote(&task.title),
            task.status.as_str().to_string(),
            due_date,
            score,
            task.estimated_minutes.to_string(),
            task.urgency.to_string(),
            task.difficulty.to_string(),
            task.grade_weight.to_string(),
        ];
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    csv
}

pub struct ExportTasksParameters {
    /// Written to stdout by the caller when absent
    pub output: Option<PathBuf>,
}

/// Renders every task of the owner. Returns the CSV text and the number of
/// rows, after writing it to `output` if one was given.
pub fn export_tasks<B: Backend>(
    planner: &mut Planner<B>,
    parameters: ExportTasksParameters,
) -> Result<(String, usize), ExportError> {
    let tasks = planner.tasks(None)?;
    let csv = render_csv(&tasks);

    if let Some(path) = parameters.output {
        fs::write(&path, &csv).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), rows = tasks.len(), "tasks exported");
    }

    Ok((csv, tasks.len()))
}
