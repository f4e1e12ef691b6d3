//! Business-time source.
//!
//! The shop day is a **local** calendar concept: ledger attribution, the
//! confirmation cutoff and the edit/cancel windows all reason about the
//! wall clock of the configured timezone, never UTC day boundaries. The
//! engine receives its clock through the builder so tests can pin time.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

pub trait Clock: fmt::Debug + Send + Sync {
    /// Current wall-clock time in the business timezone.
    fn now(&self) -> NaiveDateTime;

    /// Current business date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Clock backed by the system time, projected into a fixed timezone.
#[derive(Clone, Debug)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    #[must_use]
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(chrono_tz::Europe::Rome)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }
}

/// Settable clock for tests. Clones share the same instant, so a clock
/// handed to the engine can still be advanced from the test body.
#[derive(Clone, Debug)]
pub struct FixedClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl FixedClock {
    #[must_use]
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        match self.now.lock() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
