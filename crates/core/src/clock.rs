//! Wall-clock abstraction used for interest accrual and transaction ids.

use std::cell::Cell;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BankError, BankResult};

const SECONDS_PER_DAY: i64 = 86_400;

/// Point in time with second precision, always UTC.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Truncates sub-second precision so ids and stored values stay stable.
    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self(Utc.timestamp_opt(value.timestamp(), 0).single().unwrap_or(value))
    }

    /// Builds a timestamp from calendar components.
    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> BankResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .map(|naive| Self(Utc.from_utc_datetime(&naive)))
            .ok_or_else(|| {
                BankError::invalid_config(format!(
                    "invalid timestamp {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
                ))
            })
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Fractional days elapsed since `earlier` (negative if `earlier` is later).
    pub fn days_since(&self, earlier: &Timestamp) -> Decimal {
        Decimal::from(self.seconds_since(earlier)) / Decimal::from(SECONDS_PER_DAY)
    }

    pub fn seconds_since(&self, earlier: &Timestamp) -> i64 {
        (self.0 - earlier.0).num_seconds()
    }

    pub fn plus(&self, duration: Duration) -> Self {
        Self(self.0 + duration)
    }

    /// `YYYY-MM-DD`
    pub fn to_date_string(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl core::fmt::Display for Timestamp {
    /// `YYYY-MM-DD HH:MM:SS`
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::from_datetime(value)
    }
}

/// Source of "now" for everything that stamps or accrues over time.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Reads the system wall clock.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug, Clone)]
pub struct FixedClock {
    current: Cell<Timestamp>,
}

impl FixedClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Cell::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.current.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.current.set(self.current.get().plus(by));
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.current.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
