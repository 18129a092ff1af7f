//! Pure list transformations behind every view: filtering by day or week,
//! priority ordering, status and difficulty aggregates, and timer arithmetic.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::{Timestamp, ToSpan};
use uuid::Uuid;

use crate::models::{
    task::{Task, TaskStatus},
    time_entry::TimeEntry,
};
use crate::priority::RATING_RANGE;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Number of tasks the dashboard lists for today.
pub const DASHBOARD_TOP_TASKS: usize = 5;

pub fn start_of_week(date: Date) -> Date {
    let offset = i64::from(date.weekday().to_monday_zero_offset());
    date.checked_sub(offset.days()).unwrap_or(date)
}

pub fn end_of_week(date: Date) -> Date {
    start_of_week(date)
        .checked_add(6.days())
        .unwrap_or(Date::MAX)
}

/// Tasks due on `day`.
pub fn bucket_by_day<'a, I>(tasks: I, day: Date) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks
        .into_iter()
        .filter(|t| t.due_date == Some(day))
        .collect()
}

/// Tasks due in the Monday-start week containing `reference`, plus the ones
/// already overdue relative to `reference`.
pub fn bucket_by_week<'a, I>(tasks: I, reference: Date) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let week_start = start_of_week(reference);
    let week_end = end_of_week(reference);

    tasks
        .into_iter()
        .filter(|t| match t.due_date {
            Some(due) => (week_start <= due && due <= week_end) || due < reference,
            None => false,
        })
        .collect()
}

/// Count of tasks per status. Every status is present, empty ones with zero.
pub fn aggregate_by_status<'a, I>(tasks: I) -> BTreeMap<TaskStatus, usize>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut counts: BTreeMap<TaskStatus, usize> =
        TaskStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for task in tasks {
        *counts.entry(task.status).or_insert(0) += 1;
    }
    counts
}

/// Minutes tracked per difficulty level (1-5, all present). Entries without a
/// duration count as zero and entries of unknown tasks are skipped.
pub fn aggregate_minutes_by_difficulty(
    tasks: &[Task],
    entries: &[TimeEntry],
) -> BTreeMap<u8, i64> {
    let difficulty_by_task: HashMap<Uuid, u8> =
        tasks.iter().map(|t| (t.id, t.difficulty)).collect();

    let mut minutes: BTreeMap<u8, i64> = RATING_RANGE.map(|level| (level, 0)).collect();
    for entry in entries {
        let Some(difficulty) = difficulty_by_task.get(&entry.task_id) else {
            continue;
        };
        if let Some(total) = minutes.get_mut(difficulty) {
            *total += entry.recorded_minutes();
        }
    }
    minutes
}

/// Highest score first. The sort is stable, so ties keep their input order.
pub fn sort_by_priority_descending<'a, I>(tasks: I) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut sorted: Vec<&Task> = tasks.into_iter().collect();
    sorted.sort_by(|a, b| b.priority_or_zero().total_cmp(&a.priority_or_zero()));
    sorted
}

/// Whole minutes between two instants, rounding half a minute up. An end
/// before the start yields zero.
pub fn compute_elapsed_minutes(start: Timestamp, end: Timestamp) -> i64 {
    let millis = end.as_millisecond() - start.as_millisecond();
    if millis <= 0 {
        return 0;
    }
    (millis + MILLIS_PER_MINUTE / 2) / MILLIS_PER_MINUTE
}

fn open_tasks<'a, I>(tasks: I) -> impl Iterator<Item = &'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks.into_iter().filter(|t| t.is_open())
}

fn local_date(timestamp: Timestamp, tz: &TimeZone) -> Date {
    tz.to_datetime(timestamp).date()
}

/// Open tasks due today or earlier, by priority.
pub fn today_view(tasks: &[Task], today: Date) -> Vec<&Task> {
    sort_by_priority_descending(
        open_tasks(tasks).filter(|t| t.due_date.is_some_and(|due| due <= today)),
    )
}

#[derive(Debug)]
pub struct DayBucket<'a> {
    pub date: Date,
    pub tasks: Vec<&'a Task>,
}

#[derive(Debug)]
pub struct WeekView<'a> {
    /// Open tasks due before Monday of this week
    pub overdue: Vec<&'a Task>,
    /// Monday to Sunday
    pub days: Vec<DayBucket<'a>>,
}

pub fn week_view(tasks: &[Task], reference: Date) -> WeekView<'_> {
    let week_start = start_of_week(reference);
    let in_week = bucket_by_week(open_tasks(tasks), reference);

    let overdue = sort_by_priority_descending(
        in_week
            .iter()
            .copied()
            .filter(|t| t.due_date.is_some_and(|due| due < week_start)),
    );

    WeekView {
        overdue,
        days: day_buckets(&in_week, week_start, 7),
    }
}

/// One bucket per day for `days` consecutive days starting at `start`.
pub fn schedule_view(tasks: &[Task], start: Date, days: usize) -> Vec<DayBucket<'_>> {
    let open: Vec<&Task> = open_tasks(tasks).collect();
    day_buckets(&open, start, days)
}

fn day_buckets<'a>(tasks: &[&'a Task], start: Date, days: usize) -> Vec<DayBucket<'a>> {
    start
        .series(1.day())
        .take(days)
        .map(|date| DayBucket {
            date,
            tasks: sort_by_priority_descending(bucket_by_day(tasks.iter().copied(), date)),
        })
        .collect()
}

/// Every open task, by priority.
pub fn priorities_view(tasks: &[Task]) -> Vec<&Task> {
    sort_by_priority_descending(open_tasks(tasks))
}

/// Completed tasks with the minutes tracked on each.
pub fn completed_view<'a>(tasks: &'a [Task], entries: &[TimeEntry]) -> Vec<(&'a Task, i64)> {
    tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .map(|t| (t, time_spent_on(t.id, entries)))
        .collect()
}

pub fn time_spent_on(task_id: Uuid, entries: &[TimeEntry]) -> i64 {
    entries
        .iter()
        .filter(|e| e.task_id == task_id)
        .map(TimeEntry::recorded_minutes)
        .sum()
}

/// The running entry, if any. Only the first one is reported.
pub fn active_entry(entries: &[TimeEntry]) -> Option<&TimeEntry> {
    entries.iter().find(|e| e.is_running())
}

pub fn dates_with_tasks(tasks: &[Task]) -> BTreeSet<Date> {
    tasks.iter().filter_map(|t| t.due_date).collect()
}

/// Case-insensitive title search with an optional status filter.
pub fn search_tasks<'a>(
    tasks: &'a [Task],
    query: &str,
    status: Option<TaskStatus>,
) -> Vec<&'a Task> {
    let needle = query.to_lowercase();
    tasks
        .iter()
        .filter(|t| t.title.to_lowercase().contains(&needle))
        .filter(|t| status.is_none_or(|s| t.status == s))
        .collect()
}

#[derive(Debug)]
pub struct DashboardStats<'a> {
    pub total_tasks: usize,
    pub due_today: usize,
    /// Completions in the Monday-start week containing today
    pub completed_this_week: usize,
    pub minutes_tracked_today: i64,
    pub top_today: Vec<&'a Task>,
}

pub fn dashboard_stats<'a>(
    tasks: &'a [Task],
    entries: &[TimeEntry],
    today: Date,
    tz: &TimeZone,
) -> DashboardStats<'a> {
    let week_start = start_of_week(today);
    let week_end = end_of_week(today);

    let completed_this_week = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .filter_map(|t| t.completed_at)
        .map(|at| local_date(at, tz))
        .filter(|day| week_start <= *day && *day <= week_end)
        .count();

    let minutes_tracked_today = entries
        .iter()
        .filter(|e| local_date(e.start_time, tz) == today)
        .map(TimeEntry::recorded_minutes)
        .sum();

    let mut top_today = sort_by_priority_descending(bucket_by_day(open_tasks(tasks), today));
    top_today.truncate(DASHBOARD_TOP_TASKS);

    DashboardStats {
        total_tasks: tasks.len(),
        due_today: bucket_by_day(tasks, today).len(),
        completed_this_week,
        minutes_tracked_today,
        top_today,
    }
}

/// Completed task counts for the seven days ending at `today`, oldest first.
pub fn weekly_completions(tasks: &[Task], today: Date, tz: &TimeZone) -> Vec<(Date, usize)> {
    let first_day = today.checked_sub(6.days()).unwrap_or(today);
    first_day
        .series(1.day())
        .take_while(|day| *day <= today)
        .map(|day| {
            let completed = tasks
                .iter()
                .filter_map(|t| t.completed_at)
                .filter(|at| local_date(*at, tz) == day)
                .count();
            (day, completed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn task(title: &str, due: Option<Date>, score: Option<f64>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            due_date: due,
            priority_score: score,
            difficulty: 3,
            ..Task::default()
        }
    }

    fn completed(title: &str, at: &str) -> Task {
        Task {
            status: TaskStatus::Completed,
            completed_at: Some(at.parse().unwrap()),
            ..task(title, None, None)
        }
    }

    fn entry(task_id: Uuid, start: &str, minutes: Option<i64>) -> TimeEntry {
        TimeEntry {
            id: Uuid::new_v4(),
            task_id,
            start_time: start.parse().unwrap(),
            duration_minutes: minutes,
            end_time: minutes.map(|_| start.parse().unwrap()),
            ..TimeEntry::default()
        }
    }

    fn titles(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn test_week_boundaries_start_on_monday() {
        // 2024-03-07 is a Thursday
        assert_eq!(start_of_week(date(2024, 3, 7)), date(2024, 3, 4));
        assert_eq!(end_of_week(date(2024, 3, 7)), date(2024, 3, 10));
        assert_eq!(start_of_week(date(2024, 3, 4)), date(2024, 3, 4));
        assert_eq!(start_of_week(date(2024, 3, 10)), date(2024, 3, 4));
    }

    #[test]
    fn test_bucket_by_day_uses_calendar_equality() {
        let tasks = vec![task("essay", Some(date(2024, 3, 5)), None)];

        assert_eq!(bucket_by_day(&tasks, date(2024, 3, 5)).len(), 1);
        assert!(bucket_by_day(&tasks, date(2024, 3, 6)).is_empty());
    }

    #[test]
    fn test_bucket_by_week_includes_overdue_and_excludes_next_week() {
        let reference = date(2024, 3, 7);
        let tasks = vec![
            task("last month", Some(date(2024, 2, 1)), None),
            task("monday", Some(date(2024, 3, 4)), None),
            task("sunday", Some(date(2024, 3, 10)), None),
            task("next monday", Some(date(2024, 3, 11)), None),
            task("undated", None, None),
        ];

        let selected = bucket_by_week(&tasks, reference);
        assert_eq!(titles(&selected), vec!["last month", "monday", "sunday"]);
    }

    #[test]
    fn test_aggregate_by_status_reports_empty_buckets() {
        let tasks = vec![
            task("a", None, None),
            task("b", None, None),
            completed("c", "2024-03-05T12:00:00Z"),
        ];

        let counts = aggregate_by_status(&tasks);
        assert_eq!(counts[&TaskStatus::Pending], 2);
        assert_eq!(counts[&TaskStatus::InProgress], 0);
        assert_eq!(counts[&TaskStatus::Completed], 1);
    }

    #[test]
    fn test_aggregate_minutes_by_difficulty() {
        let easy = Task {
            difficulty: 1,
            ..task("easy", None, None)
        };
        let hard = Task {
            difficulty: 5,
            ..task("hard", None, None)
        };
        let entries = vec![
            entry(easy.id, "2024-03-05T09:00:00Z", Some(25)),
            entry(hard.id, "2024-03-05T10:00:00Z", Some(50)),
            entry(hard.id, "2024-03-05T11:00:00Z", Some(10)),
            entry(hard.id, "2024-03-05T12:00:00Z", None),
            entry(Uuid::new_v4(), "2024-03-05T13:00:00Z", Some(999)),
        ];

        let minutes = aggregate_minutes_by_difficulty(&[easy, hard], &entries);
        assert_eq!(minutes.len(), 5);
        assert_eq!(minutes[&1], 25);
        assert_eq!(minutes[&2], 0);
        assert_eq!(minutes[&5], 60);
    }

    #[test]
    fn test_sort_treats_missing_score_as_zero() {
        let tasks = vec![
            task("low", None, Some(0.3)),
            task("unscored", None, None),
            task("high", None, Some(0.8)),
        ];

        let sorted = sort_by_priority_descending(&tasks);
        assert_eq!(titles(&sorted), vec!["high", "low", "unscored"]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let tasks = vec![
            task("first", None, Some(0.5)),
            task("second", None, Some(0.5)),
            task("zero", None, Some(0.0)),
            task("none", None, None),
            task("third", None, Some(0.5)),
        ];

        let sorted = sort_by_priority_descending(&tasks);
        assert_eq!(
            titles(&sorted),
            vec!["first", "second", "third", "zero", "none"]
        );
    }

    #[test]
    fn test_elapsed_minutes() {
        let start: Timestamp = "2024-01-01T10:00:00Z".parse().unwrap();
        let end: Timestamp = "2024-01-01T10:30:00Z".parse().unwrap();
        assert_eq!(compute_elapsed_minutes(start, end), 30);
    }

    #[test]
    fn test_elapsed_minutes_rounds_half_up() {
        let start: Timestamp = "2024-01-01T10:00:00Z".parse().unwrap();
        let just_under: Timestamp = "2024-01-01T10:00:29.999Z".parse().unwrap();
        let half: Timestamp = "2024-01-01T10:00:30Z".parse().unwrap();

        assert_eq!(compute_elapsed_minutes(start, just_under), 0);
        assert_eq!(compute_elapsed_minutes(start, half), 1);
        assert_eq!(compute_elapsed_minutes(half, start), 0);
    }

    #[test]
    fn test_today_view_keeps_open_overdue_tasks() {
        let today = date(2024, 3, 5);
        let done = Task {
            due_date: Some(today),
            ..completed("done", "2024-03-05T08:00:00Z")
        };
        let tasks = vec![
            task("overdue", Some(date(2024, 3, 1)), Some(0.4)),
            task("today", Some(today), Some(0.9)),
            task("tomorrow", Some(date(2024, 3, 6)), Some(1.0)),
            task("undated", None, Some(1.0)),
            done,
        ];

        assert_eq!(titles(&today_view(&tasks, today)), vec!["today", "overdue"]);
    }

    #[test]
    fn test_week_view_groups_days_and_overdue() {
        let reference = date(2024, 3, 7);
        let tasks = vec![
            task("old", Some(date(2024, 2, 28)), Some(0.5)),
            task("tue low", Some(date(2024, 3, 5)), Some(0.3)),
            task("tue high", Some(date(2024, 3, 5)), Some(0.9)),
            task("sun", Some(date(2024, 3, 10)), Some(0.5)),
            task("later", Some(date(2024, 3, 20)), Some(0.5)),
        ];

        let week = week_view(&tasks, reference);
        assert_eq!(titles(&week.overdue), vec!["old"]);
        assert_eq!(week.days.len(), 7);
        assert_eq!(week.days[0].date, date(2024, 3, 4));
        assert_eq!(titles(&week.days[1].tasks), vec!["tue high", "tue low"]);
        assert_eq!(titles(&week.days[6].tasks), vec!["sun"]);
        assert!(week.days[2].tasks.is_empty());
    }

    #[test]
    fn test_schedule_view_covers_consecutive_days() {
        let start = date(2024, 3, 30);
        let tasks = vec![
            task("april", Some(date(2024, 4, 2)), None),
            task("before", Some(date(2024, 3, 29)), None),
        ];

        let schedule = schedule_view(&tasks, start, 7);
        assert_eq!(schedule.len(), 7);
        assert_eq!(schedule[6].date, date(2024, 4, 5));
        assert_eq!(titles(&schedule[3].tasks), vec!["april"]);
        assert_eq!(schedule.iter().map(|d| d.tasks.len()).sum::<usize>(), 1);
    }

    #[test]
    fn test_completed_view_sums_time_per_task() {
        let done = completed("report", "2024-03-05T12:00:00Z");
        let entries = vec![
            entry(done.id, "2024-03-04T09:00:00Z", Some(40)),
            entry(done.id, "2024-03-05T09:00:00Z", Some(20)),
        ];
        let tasks = vec![done, task("open", None, None)];

        let view = completed_view(&tasks, &entries);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].0.title, "report");
        assert_eq!(view[0].1, 60);
    }

    #[test]
    fn test_search_filters_by_title_and_status() {
        let tasks = vec![
            task("Math homework", None, None),
            completed("Math exam", "2024-03-05T12:00:00Z"),
            task("Essay", None, None),
        ];

        assert_eq!(search_tasks(&tasks, "math", None).len(), 2);
        assert_eq!(
            titles(&search_tasks(&tasks, "MATH", Some(TaskStatus::Pending))),
            vec!["Math homework"]
        );
        assert_eq!(search_tasks(&tasks, "", None).len(), 3);
    }

    #[test]
    fn test_active_entry_and_dates_with_tasks() {
        let id = Uuid::new_v4();
        let entries = vec![
            entry(id, "2024-03-05T09:00:00Z", Some(5)),
            entry(id, "2024-03-05T10:00:00Z", None),
        ];
        assert_eq!(
            active_entry(&entries).map(|e| e.start_time),
            Some("2024-03-05T10:00:00Z".parse().unwrap())
        );

        let tasks = vec![
            task("a", Some(date(2024, 3, 5)), None),
            task("b", Some(date(2024, 3, 5)), None),
            task("c", None, None),
        ];
        assert_eq!(
            dates_with_tasks(&tasks).into_iter().collect::<Vec<_>>(),
            vec![date(2024, 3, 5)]
        );
    }

    #[test]
    fn test_dashboard_stats() {
        let today = date(2024, 3, 7);
        let tz = TimeZone::UTC;
        let mut tasks: Vec<Task> = (0..7)
            .map(|i| task(&format!("today {i}"), Some(today), Some(f64::from(i) / 10.0)))
            .collect();
        tasks.push(completed("this week", "2024-03-04T08:00:00Z"));
        tasks.push(completed("last week", "2024-03-03T08:00:00Z"));

        let entries = vec![
            entry(tasks[0].id, "2024-03-07T08:00:00Z", Some(30)),
            entry(tasks[0].id, "2024-03-06T08:00:00Z", Some(45)),
        ];

        let stats = dashboard_stats(&tasks, &entries, today, &tz);
        assert_eq!(stats.total_tasks, 9);
        assert_eq!(stats.due_today, 7);
        assert_eq!(stats.completed_this_week, 1);
        assert_eq!(stats.minutes_tracked_today, 30);
        assert_eq!(stats.top_today.len(), DASHBOARD_TOP_TASKS);
        assert_eq!(stats.top_today[0].title, "today 6");
    }

    #[test]
    fn test_dashboard_week_runs_monday_through_sunday() {
        let sunday = date(2024, 3, 10);
        let tz = TimeZone::UTC;
        let tasks = vec![
            completed("previous sunday", "2024-03-03T20:00:00Z"),
            completed("monday", "2024-03-04T08:00:00Z"),
            completed("sunday", "2024-03-10T20:00:00Z"),
            completed("next monday", "2024-03-11T08:00:00Z"),
        ];

        let stats = dashboard_stats(&tasks, &[], sunday, &tz);
        assert_eq!(stats.completed_this_week, 2);

        let stats = dashboard_stats(&tasks, &[], date(2024, 3, 3), &tz);
        assert_eq!(stats.completed_this_week, 1);
    }

    #[test]
    fn test_weekly_completions_cover_last_seven_days() {
        let tz = TimeZone::UTC;
        let tasks = vec![
            completed("a", "2024-03-07T08:00:00Z"),
            completed("b", "2024-03-07T20:00:00Z"),
            completed("c", "2024-03-01T08:00:00Z"),
            completed("too old", "2024-02-29T08:00:00Z"),
        ];

        let counts = weekly_completions(&tasks, date(2024, 3, 7), &tz);
        assert_eq!(counts.len(), 7);
        assert_eq!(counts[0], (date(2024, 3, 1), 1));
        assert_eq!(counts[6], (date(2024, 3, 7), 2));
        assert_eq!(counts.iter().map(|(_, n)| n).sum::<usize>(), 3);
    }
}
