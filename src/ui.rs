use colored::*;
use jiff::{Timestamp, civil::Date, tz::TimeZone};

use crate::models::{
    task::{Task, TaskStatus},
    time_entry::TimeEntry,
};

/// Get the terminal width, defaulting to 80 if unavailable
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Get the appropriate status glyph for a task
pub fn get_status_glyph(task: &Task, is_overdue: bool) -> ColoredString {
    match task.status {
        TaskStatus::Completed => "✓".dimmed(),
        TaskStatus::InProgress => "◐".yellow(),
        TaskStatus::Pending if is_overdue => "●".red(),
        TaskStatus::Pending => "○".normal(),
    }
}

pub fn format_score(score: Option<f64>) -> String {
    score.map(|s| format!("{s:.2}")).unwrap_or_else(|| "-".to_string())
}

/// Format a minute count as "45m" or "2h 05m"
pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    if minutes < 60 {
        format!("{minutes}m")
    } else {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    }
}

/// Right-hand context of a task line: due date, estimate and score
pub fn get_task_context(task: &Task, today: Date) -> String {
    let mut parts = vec![];
    if let Some(due) = task.due_date {
        parts.push(format!("due {}", format_date_header(due, today)));
    }
    parts.push(format_minutes(i64::from(task.estimated_minutes)));
    parts.push(format!("score {}", format_score(task.priority_score)));
    parts.join("  ·  ")
}

fn print_aligned(left_visible: &str, styled_left: ColoredString, right: &str) {
    let terminal_width = get_terminal_width();
    let total_content = left_visible.chars().count() + right.chars().count();

    if !right.is_empty() && total_content + 4 < terminal_width {
        let padding = terminal_width - total_content - 2;
        println!("{}{}{}", styled_left, " ".repeat(padding), right.dimmed());
    } else {
        println!("{}", styled_left);
    }
}

/// Render a single task line with number, glyph, title, and right-aligned context
pub fn render_task_line(task: &Task, today: Date) {
    let is_overdue = is_overdue(task, today);
    let context = get_task_context(task, today);
    render_line(task, is_overdue, &context);
}

/// Render a completed task with the time tracked on it
pub fn render_completed_line(task: &Task, tracked_minutes: i64, today: Date, tz: &TimeZone) {
    let mut context = format!("{} tracked", format_minutes(tracked_minutes));
    if let Some(completed_at) = task.completed_at {
        context = format!(
            "{}  ·  {}",
            format_completion_date(completed_at, today, tz),
            context
        );
    }
    render_line(task, false, &context);
}

fn render_line(task: &Task, is_overdue: bool, context: &str) {
    let id_str = format!("{:>3}", task.task_number);
    let glyph = get_status_glyph(task, is_overdue);

    let left_section = format!("  {}  {}  {}", id_str, glyph, task.title);
    let left_visible = format!("  {}  {}  {}", id_str, " ", task.title);

    let styled_left = if task.status == TaskStatus::Completed {
        left_section.dimmed()
    } else {
        left_section.bold()
    };

    print_aligned(&left_visible, styled_left, context);
}

/// Render one time entry of the timesheet
pub fn render_time_entry_line(entry: &TimeEntry, title: &str, now: Timestamp, tz: &TimeZone) {
    let start = tz.to_datetime(entry.start_time);
    let span = match entry.end_time {
        Some(end) => format!(
            "{} – {}",
            start.strftime("%b %d %H:%M"),
            tz.to_datetime(end).strftime("%H:%M")
        ),
        None => format!("{} (running)", start.strftime("%b %d %H:%M")),
    };

    let minutes = match entry.duration_minutes {
        Some(minutes) => minutes,
        None => entry.elapsed_minutes(now),
    };

    let left_visible = format!("  {}  {}", span, title);
    let styled_left = if entry.is_running() {
        format!("  {}  {}", span.green(), title).bold()
    } else {
        format!("  {}  {}", span, title).normal()
    };
    print_aligned(&left_visible, styled_left, &format_minutes(minutes));
}

/// Render a labelled horizontal bar scaled against `max`
pub fn render_bar(label: &str, value: i64, max: i64) {
    const BAR_WIDTH: i64 = 30;
    let filled = if max > 0 {
        (value.max(0) * BAR_WIDTH + max / 2) / max
    } else {
        0
    };
    let filled = usize::try_from(filled).unwrap_or(0);
    let empty = usize::try_from(BAR_WIDTH).unwrap_or(0).saturating_sub(filled);

    println!(
        "  {:<12} {}{} {}",
        label,
        "█".repeat(filled).cyan(),
        "░".repeat(empty).dimmed(),
        value
    );
}

/// Format a completion date for display (e.g., "Feb 15", "Today", "Yesterday")
fn format_completion_date(timestamp: Timestamp, today: Date, tz: &TimeZone) -> String {
    let date = tz.to_datetime(timestamp).date();

    if date == today {
        "Today".to_string()
    } else if today.yesterday().is_ok_and(|yesterday| yesterday == date) {
        "Yesterday".to_string()
    } else {
        date.strftime("%b %d").to_string()
    }
}

/// Render a view header with title and count
pub fn render_view_header(title: &str, count: usize) {
    let task_word = if count == 1 { "task" } else { "tasks" };
    println!("\n  {} ({} {})\n", title.cyan().bold(), count, task_word);
}

/// Render a section header (e.g., "Overdue", "Tomorrow")
pub fn render_section_header(title: &str) {
    println!("\n  ─── {} ───\n", title.bold());
}

/// Render an aligned "label: value" line
pub fn render_stat(label: &str, value: impl std::fmt::Display) {
    println!("  {:<22} {}", format!("{label}:").dimmed(), value);
}

/// Check if a task is overdue
pub fn is_overdue(task: &Task, today: Date) -> bool {
    task.is_open() && task.due_date.is_some_and(|due| due < today)
}

/// Format a date as a human-readable header (e.g., "Tomorrow", "Monday, Feb 17")
pub fn format_date_header(date: Date, today: Date) -> String {
    if date == today {
        "Today".to_string()
    } else if today.tomorrow().is_ok_and(|tomorrow| tomorrow == date) {
        "Tomorrow".to_string()
    } else if today.yesterday().is_ok_and(|yesterday| yesterday == date) {
        "Yesterday".to_string()
    } else {
        date.strftime("%A, %b %d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(60), "1h 00m");
        assert_eq!(format_minutes(125), "2h 05m");
        assert_eq!(format_minutes(-3), "0m");
    }

    #[test]
    fn test_format_date_header() {
        let today = date(2024, 3, 5);
        assert_eq!(format_date_header(today, today), "Today");
        assert_eq!(format_date_header(date(2024, 3, 6), today), "Tomorrow");
        assert_eq!(format_date_header(date(2024, 3, 4), today), "Yesterday");
        assert_eq!(format_date_header(date(2024, 3, 11), today), "Monday, Mar 11");
    }

    #[test]
    fn test_is_overdue_only_for_open_tasks() {
        let today = date(2024, 3, 5);
        let mut task = Task {
            due_date: Some(date(2024, 3, 4)),
            ..Task::default()
        };
        assert!(is_overdue(&task, today));

        task.status = TaskStatus::Completed;
        assert!(!is_overdue(&task, today));

        task.status = TaskStatus::Pending;
        task.due_date = Some(today);
        assert!(!is_overdue(&task, today));
    }

    #[test]
    fn test_task_context() {
        let today = date(2024, 3, 5);
        let task = Task {
            due_date: Some(date(2024, 3, 6)),
            estimated_minutes: 90,
            priority_score: Some(0.6),
            ..Task::default()
        };
        assert_eq!(
            get_task_context(&task, today),
            "due Tomorrow  ·  1h 30m  ·  score 0.60"
        );
    }
}
