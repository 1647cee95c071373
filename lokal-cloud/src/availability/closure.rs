//! Closure windows

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use shared::models::ClosureWindow;

/// First window that covers `at` in the business time zone
///
/// A window needs both bounds to match; `weekday` is 0 = Sunday and `None`
/// means every day. Both bounds are inclusive.
pub fn matching_window(windows: &[ClosureWindow], at: DateTime<Utc>, tz: Tz) -> Option<&ClosureWindow> {
    let local = at.with_timezone(&tz);
    let weekday = local.weekday().num_days_from_sunday() as i16;
    let time = local.time();

    windows.iter().find(|w| {
        if !w.active {
            return false;
        }
        if w.weekday.is_some_and(|d| d != weekday) {
            return false;
        }
        match (w.start_time, w.end_time) {
            (Some(start), Some(end)) => start <= time && time <= end,
            _ => false,
        }
    })
}

pub fn is_closed(windows: &[ClosureWindow], at: DateTime<Utc>, tz: Tz) -> bool {
    matching_window(windows, at, tz).is_some()
}
