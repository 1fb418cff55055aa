//! Pure schedule math for the nightly window.
//!
//! Turns the human-framed window (start hour, exclusive end hour, interval)
//! into the concrete firing sets the timer registers. No state, no I/O.

/// Ordered hours at which ordinary wakeups fire.
///
/// `night_end` is exclusive: ordinary wakeups run through `night_end - 1`
/// (23 when `night_end` is 0), and the closing wakeup at `night_end:00` is
/// scheduled separately. A window crossing midnight wraps:
/// start 22 / end 5 gives `[22, 23, 0, 1, 2, 3, 4]`.
///
/// Degenerate windows fall out of the same rule rather than being
/// special-cased: `night_start == night_end` wraps all the way around to
/// every hour of the day, and `night_start == night_end - 1` leaves the
/// single hour `[night_start]`.
pub fn ordinary_hours(night_start: u32, night_end: u32) -> Vec<u32> {
    let end_hour = if night_end > 0 { night_end - 1 } else { 23 };
    if night_start > end_hour {
        (night_start..=23).chain(0..=end_hour).collect()
    } else {
        (night_start..=end_hour).collect()
    }
}

/// Minutes past each hour at which ordinary wakeups fire.
///
/// Interval 20 gives `[0, 20, 40]`, interval 15 gives `[0, 15, 30, 45]`.
/// When the interval does not divide 60 the final gap of each hour comes up
/// short; that is accepted as-is. `interval_minutes` must be 1-60, which
/// config validation guarantees.
pub fn minute_pattern(interval_minutes: u32) -> Vec<u32> {
    (0..60).step_by(interval_minutes as usize).collect()
}

/// The closing wakeup always fires on the hour, at `night_end:00`.
pub fn last_wakeup_time(night_end: u32) -> (u32, u32) {
    (night_end, 0)
}

/// Comma-joined cron field for a set of hours or minutes.
pub fn cron_field(values: &[u32]) -> String {
    values
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// 12-hour label for the closing wakeup, e.g. `5:00 AM`.
pub fn last_wakeup_label(night_end: u32) -> String {
    match night_end {
        0 => "12:00 AM".to_string(),
        h @ 1..=11 => format!("{h}:00 AM"),
        12 => "12:00 PM".to_string(),
        h => format!("{}:00 PM", h - 12),
    }
}
