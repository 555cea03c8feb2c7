use std::collections::BTreeSet;

use crate::dates::CalendarDay;
use crate::models::TaskLog;

/// Calculates the current completion streak.
///
/// The streak is the number of consecutive calendar days, ending today or
/// yesterday, on which at least one log was completed. A day counts once no
/// matter how many tasks were completed on it.
///
/// # Returns
/// - `0` if nothing was ever completed, or the last completion was two or more
///   days before `today`.
/// - Otherwise the length of the unbroken run ending at the most recent
///   completed day. The walk stops at the first gap.
pub fn calculate_streak(logs: &[TaskLog], today: CalendarDay) -> u32 {
    let completed_days: BTreeSet<CalendarDay> = logs
        .iter()
        .filter(|log| log.completed)
        .map(|log| log.date)
        .collect();

    // most recent first
    let mut days = completed_days.iter().rev();
    let Some(most_recent) = days.next() else {
        return 0;
    };

    let since = today.days_between(most_recent);
    if since != 0 && since != 1 {
        return 0;
    }

    let mut streak = 1;
    let mut previous = most_recent;
    for day in days {
        if previous.days_between(day) != 1 {
            break;
        }
        streak += 1;
        previous = day;
    }
    streak
}
