use std::fmt::Display;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use colored::*;
use jiff::{Timestamp, civil::Date, tz::TimeZone};
use tracing_subscriber::EnvFilter;

use crate::{
    backend::StoreBackend,
    client::Planner,
    models::task::{TaskStatus, parse_due_date},
    priority::ScoreError,
    services::{
        TaskLookupError,
        export::{ExportTasksParameters, export_tasks},
        settings::{UpdateSettingsError, UpdateSettingsParameters, update_settings},
        tasks::{
            AddTaskError, AddTaskParameters, ChangeStatusError, ChangeStatusParameters,
            DeleteTaskError, DeleteTaskParameters, EditTaskError, EditTaskParameters, add_task,
            change_status, delete_task, edit_task,
        },
        timer::{
            StartTimerError, StartTimerParameters, StopTimerError, StopTimerParameters,
            start_timer, stop_timer,
        },
    },
    storage::json::JsonFileStorage,
};

mod backend;
mod cache;
mod client;
mod models;
mod priority;
mod services;
mod storage;
mod ui;
mod views;

type AppPlanner = Planner<StoreBackend<JsonFileStorage>>;

const SCHEDULE_DAYS: usize = 7;

#[derive(Parser)]
#[command(
    name = "ahplan",
    about = "A task planner that ranks your work by urgency, grade weight and difficulty"
)]
struct Cli {
    /// Path of the JSON store
    #[arg(long, global = true, env = "AHPLAN_STORE")]
    store: Option<PathBuf>,

    /// Owner of the rows read and written
    #[arg(long, global = true, env = "AHPLAN_USER", default_value = "local")]
    user: String,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show open tasks due today or earlier, by priority
    Today,

    /// Show this week's open tasks, day by day
    Week,

    /// Show the tasks due on a given day (defaults to today)
    Day { date: Option<String> },

    /// Show open tasks for the coming days
    Schedule {
        /// Number of days to show
        #[arg(long, default_value_t = SCHEDULE_DAYS)]
        days: usize,
    },

    /// Show every open task, by priority
    Priorities,

    /// Show completed tasks with the time tracked on each
    Completed,

    /// Show a summary of today and this week
    Dashboard,

    /// Show completions, status breakdown and time by difficulty
    Analytics,

    /// List and search tasks
    Tasks {
        /// Case-insensitive title fragment
        #[arg(short, long)]
        search: Option<String>,

        /// Only show tasks with this status
        #[arg(long)]
        status: Option<TaskStatus>,
    },

    /// Add a new task
    Add {
        /// Task title
        title: String,

        /// Due date (e.g., "2025-03-01", "tomorrow")
        #[arg(short, long)]
        due: Option<String>,

        /// Estimated minutes
        #[arg(short, long, default_value_t = 60)]
        estimate: u32,

        /// Urgency from 1 to 5
        #[arg(short, long, default_value_t = 3)]
        urgency: u8,

        /// Difficulty from 1 to 5
        #[arg(long, default_value_t = 3)]
        difficulty: u8,

        /// Grade weight from 1 to 5
        #[arg(short, long, default_value_t = 3)]
        grade: u8,

        /// Add notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Edit a task and recompute its priority
    Edit {
        /// Task number or part of its title
        task_number_or_fuzzy_name: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,

        /// Remove the notes
        #[arg(long, conflicts_with = "notes")]
        clear_notes: bool,

        #[arg(short, long)]
        due: Option<String>,

        /// Remove the due date
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,

        #[arg(short, long)]
        estimate: Option<u32>,

        #[arg(short, long)]
        urgency: Option<u8>,

        #[arg(long)]
        difficulty: Option<u8>,

        #[arg(short, long)]
        grade: Option<u8>,
    },

    /// Mark a task as in progress
    Start { task_number_or_fuzzy_name: String },

    /// Complete a task
    Done { task_number_or_fuzzy_name: String },

    /// Move a task back to pending
    Reopen { task_number_or_fuzzy_name: String },

    /// Delete a task and its time entries
    Delete { task_number_or_fuzzy_name: String },

    /// Track time on a task
    #[command(subcommand)]
    Timer(TimerCommands),

    /// Show recorded time entries
    Timesheet,

    /// Show or change your settings
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Export all tasks as CSV
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum TimerCommands {
    /// Start tracking time on a task
    Start { task_number_or_fuzzy_name: String },
    /// Stop the running timer
    Stop,
    /// Show the running timer
    Status,
}

#[derive(Debug, Subcommand)]
enum SettingsCommands {
    /// Show the current settings
    Show,
    /// Change one or more settings
    Set {
        #[arg(long)]
        name: Option<String>,

        /// Start of the work day (HH:MM)
        #[arg(long)]
        work_start: Option<String>,

        /// End of the work day (HH:MM)
        #[arg(long)]
        work_end: Option<String>,

        #[arg(long)]
        break_minutes: Option<u32>,

        /// Start of your most focused hours (HH:MM)
        #[arg(long)]
        peak_start: Option<String>,

        /// End of your most focused hours (HH:MM)
        #[arg(long)]
        peak_end: Option<String>,

        #[arg(long)]
        daily_hours: Option<f64>,

        /// Weight of urgency in the priority score
        #[arg(long)]
        weight_urgency: Option<f64>,

        /// Weight of grade weight in the priority score
        #[arg(long)]
        weight_grade: Option<f64>,

        /// Weight of difficulty in the priority score
        #[arg(long)]
        weight_difficulty: Option<f64>,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fail(message: impl Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn or_fail<T, E: Display>(result: Result<T, E>, context: &str) -> T {
    result.unwrap_or_else(|e| fail(format!("{}: {}", context, e)))
}

fn fail_lookup(error: TaskLookupError) -> ! {
    match error {
        TaskLookupError::TaskNotFound(reference) => {
            eprintln!("Error: Task '{}' not found", reference);
            eprintln!("\nRun `ahplan tasks` to see task numbers.");
        }
        TaskLookupError::AmbiguousTaskName(titles) => {
            eprintln!("Error: Task name is ambiguous. Multiple tasks found:");
            for title in titles {
                eprintln!("  - {}", title);
            }
            eprintln!("\nPlease be more specific or use the task number.");
        }
    }
    process::exit(1);
}

fn fail_score(error: ScoreError) -> ! {
    eprintln!("Error: {}", error);
    match error {
        ScoreError::RatingOutOfRange { .. } => {
            eprintln!("\nRatings go from 1 (lowest) to 5 (highest).");
        }
        ScoreError::InvalidWeights { .. } => {
            eprintln!("\nFix them with, for example:");
            eprintln!("  ahplan settings set --weight-urgency 0.4 --weight-grade 0.35 --weight-difficulty 0.25");
        }
    }
    process::exit(1);
}

fn fail_due_date(raw: &str, reason: &str) -> ! {
    eprintln!("Error: Invalid due date '{}': {}", raw, reason);
    eprintln!("\nExpected format: YYYY-MM-DD (e.g., 2025-03-01), 'today', 'tomorrow' or 'yesterday'");
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let storage_path = cli.store.unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ahplan")
            .join("store.json")
    });

    if let Some(parent) = storage_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).unwrap_or_else(|e| {
            fail(format!("Failed to create data directory: {}", e));
        });
    }

    let storage = JsonFileStorage::new(storage_path);
    tracing::debug!(path = %storage.path().display(), user = %cli.user, "opening store");
    let backend = or_fail(StoreBackend::open(storage), "Failed to load store");
    let mut planner = Planner::new(backend, cli.user);

    let tz = TimeZone::system();
    let now = Timestamp::now();
    let today = tz.to_datetime(now).date();

    match cli.command.unwrap_or(Commands::Today) {
        Commands::Today => show_today(&mut planner, today),
        Commands::Week => show_week(&mut planner, today),
        Commands::Day { date } => show_day(&mut planner, date, today),
        Commands::Schedule { days } => show_schedule(&mut planner, today, days),
        Commands::Priorities => show_priorities(&mut planner, today),
        Commands::Completed => show_completed(&mut planner, today, &tz),
        Commands::Dashboard => show_dashboard(&mut planner, today, &tz),
        Commands::Analytics => show_analytics(&mut planner, today, &tz),
        Commands::Tasks { search, status } => show_tasks(&mut planner, search, status, today),
        Commands::Add {
            title,
            due,
            estimate,
            urgency,
            difficulty,
            grade,
            notes,
        } => {
            let params = AddTaskParameters {
                title,
                description: notes,
                due_date: due,
                estimated_minutes: estimate,
                urgency,
                difficulty,
                grade_weight: grade,
                today,
            };

            match add_task(&mut planner, params) {
                Ok(task) => {
                    println!("✓ Task added: {}", task.title);
                    println!("  #{}", task.task_number);
                    println!("  Priority: {}", ui::format_score(task.priority_score));
                    if let Some(due) = task.due_date {
                        println!("  Due: {}", ui::format_date_header(due, today));
                    }
                }
                Err(AddTaskError::InvalidDueDate(raw, reason)) => fail_due_date(&raw, &reason),
                Err(AddTaskError::Score(e)) => fail_score(e),
                Err(e) => fail(e),
            }
        }
        Commands::Edit {
            task_number_or_fuzzy_name,
            title,
            notes,
            clear_notes,
            due,
            clear_due,
            estimate,
            urgency,
            difficulty,
            grade,
        } => {
            let params = EditTaskParameters {
                task_number_or_fuzzy_name,
                title,
                description: notes,
                clear_description: clear_notes,
                due_date: due,
                clear_due_date: clear_due,
                estimated_minutes: estimate,
                urgency,
                difficulty,
                grade_weight: grade,
                today,
            };

            match edit_task(&mut planner, params) {
                Ok(task) => {
                    println!("✓ Task updated: {}", task.title);
                    println!("  Priority: {}", ui::format_score(task.priority_score));
                }
                Err(EditTaskError::Lookup(e)) => fail_lookup(e),
                Err(EditTaskError::InvalidDueDate(raw, reason)) => fail_due_date(&raw, &reason),
                Err(EditTaskError::Score(e)) => fail_score(e),
                Err(EditTaskError::NothingToChange) => {
                    eprintln!("Error: Nothing to change");
                    eprintln!("\nPass at least one of --title, --notes, --due, --estimate, --urgency, --difficulty or --grade.");
                    process::exit(1);
                }
                Err(e) => fail(e),
            }
        }
        Commands::Start {
            task_number_or_fuzzy_name,
        } => set_status(
            &mut planner,
            task_number_or_fuzzy_name,
            TaskStatus::InProgress,
            now,
        ),
        Commands::Done {
            task_number_or_fuzzy_name,
        } => set_status(
            &mut planner,
            task_number_or_fuzzy_name,
            TaskStatus::Completed,
            now,
        ),
        Commands::Reopen {
            task_number_or_fuzzy_name,
        } => set_status(
            &mut planner,
            task_number_or_fuzzy_name,
            TaskStatus::Pending,
            now,
        ),
        Commands::Delete {
            task_number_or_fuzzy_name,
        } => {
            let params = DeleteTaskParameters {
                task_number_or_fuzzy_name,
            };
            match delete_task(&mut planner, params) {
                Ok(task) => println!("✓ Task deleted: {}", task.title),
                Err(DeleteTaskError::Lookup(e)) => fail_lookup(e),
                Err(e) => fail(e),
            }
        }
        Commands::Timer(command) => run_timer(&mut planner, command, now, &tz),
        Commands::Timesheet => show_timesheet(&mut planner, today, now, &tz),
        Commands::Settings(SettingsCommands::Show) => show_settings(&mut planner),
        Commands::Settings(SettingsCommands::Set {
            name,
            work_start,
            work_end,
            break_minutes,
            peak_start,
            peak_end,
            daily_hours,
            weight_urgency,
            weight_grade,
            weight_difficulty,
        }) => {
            let params = UpdateSettingsParameters {
                display_name: name,
                work_start_time: work_start,
                work_end_time: work_end,
                break_duration_minutes: break_minutes,
                peak_hours_start: peak_start,
                peak_hours_end: peak_end,
                daily_work_hours: daily_hours,
                ahp_weight_urgency: weight_urgency,
                ahp_weight_grade: weight_grade,
                ahp_weight_difficulty: weight_difficulty,
            };

            match update_settings(&mut planner, params) {
                Ok(_) => {
                    println!("✓ Settings updated");
                    show_settings(&mut planner);
                }
                Err(UpdateSettingsError::Weights(e)) => fail_score(e),
                Err(UpdateSettingsError::NothingToChange) => {
                    eprintln!("Error: Nothing to change");
                    eprintln!("\nRun `ahplan settings set --help` to see the available settings.");
                    process::exit(1);
                }
                Err(e) => fail(e),
            }
        }
        Commands::Export { output } => {
            let params = ExportTasksParameters {
                output: output.clone(),
            };
            match export_tasks(&mut planner, params) {
                Ok((_, rows)) if output.is_some() => {
                    let path = output.unwrap_or_default();
                    println!("✓ Exported {} tasks to {}", rows, path.display());
                }
                Ok((csv, _)) => print!("{}", csv),
                Err(e) => fail(e),
            }
        }
    }

    let stats = planner.cache().stats();
    tracing::debug!(hits = stats.hits, misses = stats.misses, "query cache");
}

fn set_status(
    planner: &mut AppPlanner,
    task_number_or_fuzzy_name: String,
    status: TaskStatus,
    now: Timestamp,
) {
    let params = ChangeStatusParameters {
        task_number_or_fuzzy_name,
        status,
        at: now,
    };

    match change_status(planner, params) {
        Ok(task) => match task.status {
            TaskStatus::Completed => println!("✓ Completed: {}", task.title),
            TaskStatus::InProgress => println!("◐ Started: {}", task.title),
            TaskStatus::Pending => println!("○ Reopened: {}", task.title),
        },
        Err(ChangeStatusError::Lookup(e)) => fail_lookup(e),
        Err(e) => fail(e),
    }
}

fn show_today(planner: &mut AppPlanner, today: Date) {
    let tasks = or_fail(planner.tasks(None), "Failed to load tasks");
    let due = views::today_view(&tasks, today);

    if due.is_empty() {
        println!("No tasks for today");
        return;
    }

    ui::render_view_header(&format!("Today ({})", today.strftime("%b %d")), due.len());

    let (overdue, due_today): (Vec<_>, Vec<_>) =
        due.into_iter().partition(|t| ui::is_overdue(t, today));

    let has_overdue = !overdue.is_empty();
    if has_overdue {
        ui::render_section_header("Overdue");
        for task in overdue {
            ui::render_task_line(task, today);
        }
    }

    if !due_today.is_empty() {
        if has_overdue {
            ui::render_section_header("Due today");
        }
        for task in due_today {
            ui::render_task_line(task, today);
        }
    }
}

fn show_week(planner: &mut AppPlanner, today: Date) {
    let tasks = or_fail(planner.tasks(None), "Failed to load tasks");
    let week = views::week_view(&tasks, today);

    let total = week.overdue.len() + week.days.iter().map(|d| d.tasks.len()).sum::<usize>();
    if total == 0 {
        println!("Nothing due this week");
        return;
    }

    let start = views::start_of_week(today);
    let end = views::end_of_week(today);
    ui::render_view_header(
        &format!("Week of {} – {}", start.strftime("%b %d"), end.strftime("%b %d")),
        total,
    );

    if !week.overdue.is_empty() {
        ui::render_section_header("Overdue");
        for task in &week.overdue {
            ui::render_task_line(task, today);
        }
    }

    for bucket in &week.days {
        if bucket.tasks.is_empty() {
            continue;
        }
        ui::render_section_header(&ui::format_date_header(bucket.date, today));
        for task in &bucket.tasks {
            ui::render_task_line(task, today);
        }
    }
}

fn show_day(planner: &mut AppPlanner, date: Option<String>, today: Date) {
    let day = match date {
        Some(raw) => match parse_due_date(&raw, today) {
            Ok(day) => day,
            Err(e) => {
                eprintln!("Error: Invalid date '{}': {}", raw, e);
                eprintln!("\nExpected format: YYYY-MM-DD (e.g., 2025-03-01), 'today', 'tomorrow' or 'yesterday'");
                process::exit(1);
            }
        },
        None => today,
    };

    let tasks = or_fail(planner.tasks(None), "Failed to load tasks");
    let due = views::sort_by_priority_descending(views::bucket_by_day(&tasks, day));

    if due.is_empty() {
        println!("No tasks due {}", ui::format_date_header(day, today));
    } else {
        ui::render_view_header(&ui::format_date_header(day, today), due.len());
        for task in due {
            ui::render_task_line(task, today);
        }
    }

    let month_start = day.first_of_month();
    let month_end = day.last_of_month();
    let busy_days: Vec<String> = views::dates_with_tasks(&tasks)
        .into_iter()
        .filter(|d| month_start <= *d && *d <= month_end && *d != day)
        .map(|d| d.strftime("%b %d").to_string())
        .collect();
    if !busy_days.is_empty() {
        println!(
            "\n  {} {}",
            "Other days with tasks this month:".dimmed(),
            busy_days.join(", ")
        );
    }
}

fn show_schedule(planner: &mut AppPlanner, today: Date, days: usize) {
    let tasks = or_fail(planner.tasks(None), "Failed to load tasks");
    let settings = or_fail(planner.settings(), "Failed to load settings");
    let buckets = views::schedule_view(&tasks, today, days);

    let total: usize = buckets.iter().map(|b| b.tasks.len()).sum();
    ui::render_view_header("Schedule", total);
    println!(
        "  {}",
        format!(
            "Work hours: {} – {}  ·  peak {} – {}",
            settings.work_start_time.strftime("%H:%M"),
            settings.work_end_time.strftime("%H:%M"),
            settings.peak_hours_start.strftime("%H:%M"),
            settings.peak_hours_end.strftime("%H:%M"),
        )
        .dimmed()
    );

    let daily_budget = (settings.daily_work_hours * 60.0).round() as i64;
    for bucket in buckets {
        let planned: i64 = bucket
            .tasks
            .iter()
            .map(|t| i64::from(t.estimated_minutes))
            .sum();
        let header = format!(
            "{}  ({} / {})",
            bucket.date.strftime("%A, %b %d"),
            ui::format_minutes(planned),
            ui::format_minutes(daily_budget)
        );
        ui::render_section_header(&header);

        if bucket.tasks.is_empty() {
            println!("  {}", "No tasks scheduled.".dimmed());
        } else {
            for task in bucket.tasks {
                ui::render_task_line(task, today);
            }
        }
        if planned > daily_budget {
            println!("  {}", "Over your daily work hours".yellow());
        }
    }
}

fn show_priorities(planner: &mut AppPlanner, today: Date) {
    let tasks = or_fail(planner.tasks(None), "Failed to load tasks");
    let ranked = views::priorities_view(&tasks);

    if ranked.is_empty() {
        println!("No open tasks");
        return;
    }

    ui::render_view_header("Priorities", ranked.len());
    for task in ranked {
        ui::render_task_line(task, today);
    }
}

fn show_completed(planner: &mut AppPlanner, today: Date, tz: &TimeZone) {
    let tasks = or_fail(planner.tasks(Some(TaskStatus::Completed)), "Failed to load tasks");
    let entries = or_fail(planner.time_entries(None), "Failed to load time entries");
    let mut completed = views::completed_view(&tasks, &entries);

    if completed.is_empty() {
        println!("No completed tasks");
        return;
    }

    completed.sort_by(|(a, _), (b, _)| b.completed_at.cmp(&a.completed_at));
    ui::render_view_header("Completed", completed.len());
    for (task, minutes) in completed {
        ui::render_completed_line(task, minutes, today, tz);
    }
}

fn show_dashboard(planner: &mut AppPlanner, today: Date, tz: &TimeZone) {
    let tasks = or_fail(planner.tasks(None), "Failed to load tasks");
    let entries = or_fail(planner.time_entries(None), "Failed to load time entries");
    let settings = or_fail(planner.settings(), "Failed to load settings");
    let stats = views::dashboard_stats(&tasks, &entries, today, tz);

    let greeting = if settings.display_name.is_empty() {
        "Dashboard".to_string()
    } else {
        format!("Hello, {}", settings.display_name)
    };
    println!("\n  {}\n", greeting.cyan().bold());

    ui::render_stat("Total tasks", stats.total_tasks);
    ui::render_stat("Due today", stats.due_today);
    ui::render_stat("Completed this week", stats.completed_this_week);
    ui::render_stat(
        "Tracked today",
        ui::format_minutes(stats.minutes_tracked_today),
    );

    if let Some(running) = views::active_entry(&entries) {
        let title = tasks
            .iter()
            .find(|t| t.id == running.task_id)
            .map(|t| t.title.as_str())
            .unwrap_or("unknown task");
        ui::render_stat("Timer", format!("running on {}", title).green());
    }

    if !stats.top_today.is_empty() {
        ui::render_section_header("Top priorities today");
        for task in stats.top_today {
            ui::render_task_line(task, today);
        }
    }
}

fn show_analytics(planner: &mut AppPlanner, today: Date, tz: &TimeZone) {
    let tasks = or_fail(planner.tasks(None), "Failed to load tasks");
    let entries = or_fail(planner.time_entries(None), "Failed to load time entries");

    ui::render_section_header("Weekly completions");
    let completions = views::weekly_completions(&tasks, today, tz);
    let max = completions.iter().map(|(_, n)| *n).max().unwrap_or(0);
    for (day, count) in &completions {
        ui::render_bar(
            &day.strftime("%a %b %d").to_string(),
            i64::try_from(*count).unwrap_or(i64::MAX),
            i64::try_from(max).unwrap_or(i64::MAX),
        );
    }

    ui::render_section_header("Status breakdown");
    let by_status = views::aggregate_by_status(&tasks);
    let max = by_status.values().copied().max().unwrap_or(0);
    for (status, count) in &by_status {
        ui::render_bar(
            status.label(),
            i64::try_from(*count).unwrap_or(i64::MAX),
            i64::try_from(max).unwrap_or(i64::MAX),
        );
    }

    ui::render_section_header("Minutes by difficulty");
    let by_difficulty = views::aggregate_minutes_by_difficulty(&tasks, &entries);
    let max = by_difficulty.values().copied().max().unwrap_or(0);
    for (level, minutes) in &by_difficulty {
        ui::render_bar(&format!("Level {}", level), *minutes, max);
    }
}

fn show_tasks(
    planner: &mut AppPlanner,
    search: Option<String>,
    status: Option<TaskStatus>,
    today: Date,
) {
    let tasks = or_fail(planner.tasks(None), "Failed to load tasks");
    let found = views::search_tasks(&tasks, search.as_deref().unwrap_or(""), status);

    if found.is_empty() {
        println!("No matching tasks");
        return;
    }

    ui::render_view_header("Tasks", found.len());
    for task in found {
        ui::render_task_line(task, today);
    }
}

fn run_timer(planner: &mut AppPlanner, command: TimerCommands, now: Timestamp, tz: &TimeZone) {
    match command {
        TimerCommands::Start {
            task_number_or_fuzzy_name,
        } => {
            let params = StartTimerParameters {
                task_number_or_fuzzy_name,
                at: now,
            };
            match start_timer(planner, params) {
                Ok((task, entry)) => {
                    println!("▶ Timer started: {}", task.title);
                    println!(
                        "  since {}",
                        tz.to_datetime(entry.start_time).strftime("%H:%M")
                    );
                }
                Err(StartTimerError::Lookup(e)) => fail_lookup(e),
                Err(StartTimerError::TimerAlreadyRunning(title)) => {
                    eprintln!("Error: A timer is already running for '{}'", title);
                    eprintln!("\nStop it first with `ahplan timer stop`.");
                    process::exit(1);
                }
                Err(e) => fail(e),
            }
        }
        TimerCommands::Stop => match stop_timer(planner, StopTimerParameters { at: now }) {
            Ok(entry) => {
                println!(
                    "■ Timer stopped: {}",
                    ui::format_minutes(entry.recorded_minutes())
                );
            }
            Err(StopTimerError::NoTimerRunning) => println!("No timer is running"),
            Err(e) => fail(e),
        },
        TimerCommands::Status => {
            let entries = or_fail(planner.time_entries(None), "Failed to load time entries");
            let Some(running) = views::active_entry(&entries) else {
                println!("No timer is running");
                return;
            };
            let tasks = or_fail(planner.tasks(None), "Failed to load tasks");
            let title = tasks
                .iter()
                .find(|t| t.id == running.task_id)
                .map(|t| t.title.as_str())
                .unwrap_or("unknown task");
            println!(
                "▶ {} for {}",
                title.bold(),
                ui::format_minutes(running.elapsed_minutes(now))
            );
        }
    }
}

fn show_timesheet(planner: &mut AppPlanner, today: Date, now: Timestamp, tz: &TimeZone) {
    let entries = or_fail(planner.time_entries(None), "Failed to load time entries");
    let tasks = or_fail(planner.tasks(None), "Failed to load tasks");

    if entries.is_empty() {
        println!("No time entries yet");
        return;
    }

    let week_start = views::start_of_week(today);
    let tracked_today: i64 = entries
        .iter()
        .filter(|e| tz.to_datetime(e.start_time).date() == today)
        .map(|e| e.elapsed_minutes(now))
        .sum();
    let tracked_week: i64 = entries
        .iter()
        .filter(|e| {
            let day = tz.to_datetime(e.start_time).date();
            week_start <= day && day <= today
        })
        .map(|e| e.elapsed_minutes(now))
        .sum();

    println!("\n  {}\n", "Timesheet".cyan().bold());
    ui::render_stat("Today", ui::format_minutes(tracked_today));
    ui::render_stat("This week", ui::format_minutes(tracked_week));

    let mut current_day: Option<Date> = None;
    for entry in &entries {
        let day = tz.to_datetime(entry.start_time).date();
        if current_day != Some(day) {
            ui::render_section_header(&ui::format_date_header(day, today));
            current_day = Some(day);
        }
        let title = tasks
            .iter()
            .find(|t| t.id == entry.task_id)
            .map(|t| t.title.as_str())
            .unwrap_or("unknown task");
        ui::render_time_entry_line(entry, title, now, tz);
    }
}

fn show_settings(planner: &mut AppPlanner) {
    let settings = or_fail(planner.settings(), "Failed to load settings");

    println!("\n  {}\n", "Settings".cyan().bold());
    let name = if settings.display_name.is_empty() {
        "-".to_string()
    } else {
        settings.display_name.clone()
    };
    ui::render_stat("Name", name);
    ui::render_stat(
        "Work hours",
        format!(
            "{} – {}",
            settings.work_start_time.strftime("%H:%M"),
            settings.work_end_time.strftime("%H:%M")
        ),
    );
    ui::render_stat(
        "Break",
        ui::format_minutes(i64::from(settings.break_duration_minutes)),
    );
    ui::render_stat(
        "Peak hours",
        format!(
            "{} – {}",
            settings.peak_hours_start.strftime("%H:%M"),
            settings.peak_hours_end.strftime("%H:%M")
        ),
    );
    ui::render_stat("Daily work hours", settings.daily_work_hours);
    ui::render_stat(
        "Weights",
        format!(
            "urgency {}  ·  grade {}  ·  difficulty {}",
            settings.weights.urgency, settings.weights.grade, settings.weights.difficulty
        ),
    );
}
