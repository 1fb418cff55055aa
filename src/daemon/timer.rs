//! Next-fire computation for the nightly schedule.
//!
//! Two cron schedules drive the daemon: ordinary wakeups at the cross
//! product of the night's hours and the minute pattern, and the single
//! closing wakeup at `night_end:00`. The daemon sleeps until whichever
//! fires first. Ties go to the closing fire.

use chrono::{DateTime, Local};
use cron::Schedule;
use nocturne_core::config::ScheduleConfig;
use nocturne_core::error::{NocturneError, Result};
use nocturne_core::schedule::{cron_field, last_wakeup_time, minute_pattern, ordinary_hours};
use std::str::FromStr;

/// Which trigger a fire came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireKind {
    /// One of the {hours} x {minutes} wakeups.
    Ordinary,
    /// The single `night_end:00` wakeup.
    Closing,
}

/// The two cron schedules for one nightly window.
pub struct NightTimer {
    ordinary: Schedule,
    closing: Schedule,
}

impl NightTimer {
    /// Build both schedules from the configured window.
    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        let hours = cron_field(&ordinary_hours(config.night_start, config.night_end));
        let minutes = cron_field(&minute_pattern(config.interval_minutes));
        let (close_hour, close_minute) = last_wakeup_time(config.night_end);

        Ok(Self {
            ordinary: parse(&format!("0 {minutes} {hours} * * *"))?,
            closing: parse(&format!("0 {close_minute} {close_hour} * * *"))?,
        })
    }

    /// The next fire strictly after `after`, and which trigger it is.
    ///
    /// When both triggers land on the same instant the closing fire wins,
    /// so a degenerate window never delivers an ordinary wakeup at its own
    /// closing time.
    pub fn next_fire(&self, after: DateTime<Local>) -> Result<(FireKind, DateTime<Local>)> {
        let ordinary = self.ordinary.after(&after).next();
        let closing = self.closing.after(&after).next();
        match (ordinary, closing) {
            (Some(o), Some(c)) if o < c => Ok((FireKind::Ordinary, o)),
            (_, Some(c)) => Ok((FireKind::Closing, c)),
            (Some(o), None) => Ok((FireKind::Ordinary, o)),
            (None, None) => Err(NocturneError::Schedule(
                "no upcoming fire for either trigger".to_string(),
            )),
        }
    }
}

fn parse(expr: &str) -> Result<Schedule> {
    Schedule::from_str(expr)
        .map_err(|e| NocturneError::Schedule(format!("bad cron expression {expr:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn timer(night_start: u32, night_end: u32, interval: u32) -> NightTimer {
        NightTimer::from_config(&ScheduleConfig {
            night_start,
            night_end,
            interval_minutes: interval,
        })
        .unwrap()
    }

    fn at(d: u32, h: u32, mi: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_next_fire_enters_the_window() {
        let (kind, when) = timer(22, 5, 20).next_fire(at(10, 21, 59)).unwrap();
        assert_eq!(kind, FireKind::Ordinary);
        assert_eq!(when, at(10, 22, 0));
    }

    #[test]
    fn test_next_fire_follows_minute_pattern() {
        let (kind, when) = timer(22, 5, 20).next_fire(at(10, 22, 5)).unwrap();
        assert_eq!(kind, FireKind::Ordinary);
        assert_eq!(when, at(10, 22, 20));
    }

    #[test]
    fn test_next_fire_crosses_midnight() {
        let (kind, when) = timer(22, 5, 20).next_fire(at(10, 23, 41)).unwrap();
        assert_eq!(kind, FireKind::Ordinary);
        assert_eq!(when, at(11, 0, 0));
    }

    #[test]
    fn test_closing_fire_after_final_ordinary() {
        // 04:40 is the last ordinary wakeup; 05:00 closes the night.
        let (kind, when) = timer(22, 5, 20).next_fire(at(11, 4, 40)).unwrap();
        assert_eq!(kind, FireKind::Closing);
        assert_eq!(when, at(11, 5, 0));
    }

    #[test]
    fn test_window_resumes_after_closing() {
        let (kind, when) = timer(22, 5, 20).next_fire(at(11, 5, 0)).unwrap();
        assert_eq!(kind, FireKind::Ordinary);
        assert_eq!(when, at(11, 22, 0));
    }

    #[test]
    fn test_daytime_gap_has_no_ordinary_fires() {
        let (kind, when) = timer(22, 5, 20).next_fire(at(11, 12, 30)).unwrap();
        assert_eq!(kind, FireKind::Ordinary);
        assert_eq!(when, at(11, 22, 0));
    }

    #[test]
    fn test_closing_wins_a_shared_instant() {
        // start == end wraps the window over every hour, so 05:00 is both
        // an ordinary fire and the closing fire.
        let (kind, when) = timer(5, 5, 60).next_fire(at(11, 4, 30)).unwrap();
        assert_eq!(kind, FireKind::Closing);
        assert_eq!(when, at(11, 5, 0));
    }

    #[test]
    fn test_fires_are_strictly_in_the_future() {
        let now = at(11, 4, 40);
        let (_, when) = timer(22, 5, 20).next_fire(now).unwrap();
        assert!(when > now);
    }

    #[test]
    fn test_every_window_parses() {
        for start in 0..24 {
            for end in 0..24 {
                timer(start, end, 15);
            }
        }
        for interval in [1, 7, 15, 20, 30, 45, 60] {
            timer(22, 5, interval);
        }
    }
}
