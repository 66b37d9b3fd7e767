//! Phase timestamps for one probe run

use chrono::{DateTime, Local};

/// Format a timestamp the way probe subjects and reports carry it:
/// local time, ISO-8601, microsecond precision, no offset.
#[must_use]
pub fn iso8601(ts: &DateTime<Local>) -> String {
    ts.naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Hands out wall-clock marks that never go backwards.
///
/// If the system clock steps back between two phases, the later mark
/// repeats the earlier one instead, so every derived duration stays
/// non-negative.
#[derive(Debug, Default)]
pub struct Timeline {
    last: Option<DateTime<Local>>,
}

impl Timeline {
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Take the next mark from the local clock.
    pub fn mark(&mut self) -> DateTime<Local> {
        self.mark_at(Local::now())
    }

    /// Take the next mark from a given reading.
    pub fn mark_at(&mut self, now: DateTime<Local>) -> DateTime<Local> {
        let ts = match self.last {
            Some(last) if now < last => last,
            _ => now,
        };
        self.last = Some(ts);
        ts
    }
}
