//! Debounced save scheduling.
//!
//! Each change pushes the deadline out to `now + quiet_period`, so a burst of
//! edits produces one save once the burst goes quiet.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
pub struct SaveScheduler {
    quiet_period: Duration,
    deadline: Option<DateTime<Utc>>,
}

impl SaveScheduler {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            deadline: None,
        }
    }

    pub fn mark_changed(&mut self, now: DateTime<Utc>) {
        self.deadline = Some(now + self.quiet_period);
    }

    /// True (and clears the pending save) once the deadline has passed
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Clear the pending save regardless of the deadline.
    /// Returns whether one was pending.
    pub fn flush(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }
}
