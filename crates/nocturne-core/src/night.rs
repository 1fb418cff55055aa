//! Night-cycle state: which night is in progress, and its session.
//!
//! A "night" is identified by the calendar date it began on. Wakeups after
//! midnight but before the window closes still belong to the previous
//! evening's night, so they carry yesterday's date. The only persistent
//! state is the live session and its night date; first/middle/last are
//! transient classifications applied per wakeup.

use chrono::{DateTime, Duration, Local, NaiveDate, Timelike};
use uuid::Uuid;

/// One continuous agent conversation spanning a single night.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightSession {
    /// Opaque conversation identity handed to the agent.
    pub id: String,
    /// Date of the night this session belongs to.
    pub night_date: NaiveDate,
}

/// How an ordinary wakeup relates to the night in progress.
///
/// The closing wakeup is not classified here; it is identified by which
/// timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeupKind {
    /// Opens a new night: no session yet, or the night date rolled over.
    First,
    /// Continues the current night's session.
    Middle,
}

/// The date of the night a wakeup at `now` belongs to.
///
/// Before `night_end` we are still inside the night that started the
/// previous evening, so the label is yesterday's date. Recomputed from the
/// clock on every wakeup, never cached.
pub fn night_date_for(now: DateTime<Local>, night_end: u32) -> NaiveDate {
    if now.hour() < night_end {
        now.date_naive() - Duration::days(1)
    } else {
        now.date_naive()
    }
}

/// Session state for the night in progress.
///
/// Owned by the daemon; mutation is confined to the wakeup handlers, which
/// the scheduling loop runs one at a time.
#[derive(Debug, Default)]
pub struct NightCycle {
    session: Option<NightSession>,
}

impl NightCycle {
    pub fn new() -> Self {
        Self { session: None }
    }

    /// The live session, if a night is in progress.
    pub fn session(&self) -> Option<&NightSession> {
        self.session.as_ref()
    }

    /// Classify an ordinary wakeup at `now`.
    ///
    /// `First` when there is no session or the stored night date differs
    /// from the current one; `Middle` otherwise. A date change alone opens
    /// a new night even if the daemon never restarted.
    pub fn classify(&self, now: DateTime<Local>, night_end: u32) -> WakeupKind {
        let tonight = night_date_for(now, night_end);
        match &self.session {
            Some(session) if session.night_date == tonight => WakeupKind::Middle,
            _ => WakeupKind::First,
        }
    }

    /// Mint a fresh session for the night containing `now`, replacing any
    /// previous one. The replaced session is never resumed again.
    pub fn begin_night(&mut self, now: DateTime<Local>, night_end: u32) -> &NightSession {
        self.session.insert(NightSession {
            id: Uuid::new_v4().to_string(),
            night_date: night_date_for(now, night_end),
        })
    }
}
