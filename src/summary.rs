//! Read-side queries over tasks and logs: per-day buckets, per-task history,
//! and the list of tasks still open today.

use std::collections::{BTreeMap, HashMap};

use crate::dates::{CalendarDay, YearMonth};
use crate::models::{DailySummary, PendingTask, Task, TaskLog};

/// Buckets the logs of `month` by day.
///
/// Days without any log are left out of the map entirely, so a missing key
/// means "no data" rather than a day of zero activity.
pub fn monthly_summaries(
    tasks: &[Task],
    logs: &[TaskLog],
    month: YearMonth,
) -> BTreeMap<CalendarDay, DailySummary> {
    let estimates: HashMap<u64, u32> = tasks.iter().map(|t| (t.id, t.estimated_time)).collect();

    let mut summaries: BTreeMap<CalendarDay, DailySummary> = BTreeMap::new();
    for log in logs.iter().filter(|log| month.contains(&log.date)) {
        let summary = summaries.entry(log.date).or_default();
        summary.total_tasks += 1;
        if log.completed {
            summary.completed_tasks += 1;
        }
        summary.total_actual_time += u64::from(log.actual_time);
        // a log whose task is gone contributes no estimate
        summary.total_estimated_time += estimates.get(&log.task_id).copied().map(u64::from).unwrap_or(0);
    }
    summaries
}

/// Adds up a month of daily summaries.
pub fn month_totals(summaries: &BTreeMap<CalendarDay, DailySummary>) -> DailySummary {
    summaries.values().fold(DailySummary::default(), |acc, s| DailySummary {
        total_tasks: acc.total_tasks + s.total_tasks,
        completed_tasks: acc.completed_tasks + s.completed_tasks,
        total_estimated_time: acc.total_estimated_time + s.total_estimated_time,
        total_actual_time: acc.total_actual_time + s.total_actual_time,
    })
}

pub fn logs_for_date<'a>(logs: &'a [TaskLog], date: &CalendarDay) -> Vec<&'a TaskLog> {
    logs.iter().filter(|log| log.date == *date).collect()
}

pub fn logs_for_task(logs: &[TaskLog], task_id: u64) -> Vec<&TaskLog> {
    logs.iter().filter(|log| log.task_id == task_id).collect()
}

/// Tasks with no log today, or whose log today is not completed.
///
/// Tasks keep their stored order.
pub fn pending_tasks(tasks: &[Task], logs: &[TaskLog], today: &CalendarDay) -> Vec<PendingTask> {
    let todays_logs = logs_for_date(logs, today);
    tasks
        .iter()
        .map(|task| PendingTask {
            task: task.clone(),
            log: todays_logs.iter().find(|log| log.task_id == task.id).map(|log| (*log).clone()),
        })
        .filter(|pending| pending.log.as_ref().map_or(true, |log| !log.completed))
        .collect()
}
