//! Calendar-day scoping.
//!
//! Every piece of engine state is bucketed by a [`Day`]: a UTC calendar
//! date compared by value, never by timestamp range. The [`Clock`] seam
//! exists so the day-rollover checks in the refill loop and the
//! day-closed gate on winner queries are testable without waiting for
//! midnight.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A calendar date in the engine's reference timezone (UTC).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Day(NaiveDate);

impl Day {
    /// Wraps a calendar date.
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Builds a day from year/month/day, `None` for invalid dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The underlying date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The previous calendar day, `None` at the representable minimum.
    pub fn pred(&self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }

    /// The next calendar day, `None` at the representable maximum.
    pub fn succ(&self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // NaiveDate renders as YYYY-MM-DD, the same shape the key scheme
        // and the transport layer use
        write!(f, "{}", self.0)
    }
}

impl FromStr for Day {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Self)
    }
}

/// Source of the current day.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current calendar day in the reference timezone.
    fn today(&self) -> Day;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Day {
        Day(Utc::now().date_naive())
    }
}

/// A clock advanced by hand. Used by tests and simulations that need to
/// drive day rollovers deterministically.
#[derive(Debug)]
pub struct ManualClock {
    today: Mutex<NaiveDate>,
}

impl ManualClock {
    /// Creates a clock pinned at `day`.
    pub fn starting_at(day: Day) -> Self {
        Self {
            today: Mutex::new(day.0),
        }
    }

    /// Moves the clock to `day`.
    pub fn set(&self, day: Day) {
        *self.today.lock().unwrap_or_else(|e| e.into_inner()) = day.0;
    }

    /// Advances the clock by `days` calendar days.
    pub fn advance_days(&self, days: u64) {
        let mut today = self.today.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = today.checked_add_days(chrono::Days::new(days)) {
            *today = next;
        }
    }
}

impl Clock for ManualClock {
    fn today(&self) -> Day {
        Day(*self.today.lock().unwrap_or_else(|e| e.into_inner()))
    }
}
