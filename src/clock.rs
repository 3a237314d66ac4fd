//! Time source injected into the progression engine
//!
//! The engine never reads system time directly. Every "now" and every
//! calendar-day decision goes through a [`Clock`], so tests can pin the
//! instant and the local UTC offset.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, Offset, Utc};

/// Supplies the current instant and the local calendar day
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day in the local timezone at the moment of the call
    fn today(&self) -> NaiveDate;
}

/// Wall clock using the machine's local timezone
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
struct ManualState {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

/// Settable clock for tests and replay tooling
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<ManualState>,
}

impl ManualClock {
    /// Clock pinned at `now` in UTC
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_offset(now, Utc.fix())
    }

    /// Clock pinned at `now`, reporting calendar days in `offset`
    pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            state: Mutex::new(ManualState { now, offset }),
        }
    }

    /// Clock at `hour`:00 UTC on `day`
    pub fn at_day(day: NaiveDate, hour: u32) -> Self {
        let now = day
            .and_hms_opt(hour.min(23), 0, 0)
            .unwrap_or_default()
            .and_utc();
        Self::new(now)
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.lock().now = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut state = self.lock();
        state.now += by;
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }

    pub fn set_offset(&self, offset: FixedOffset) {
        self.lock().offset = offset;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.lock().now
    }

    fn today(&self) -> NaiveDate {
        let state = *self.lock();
        state.now.with_timezone(&state.offset).date_naive()
    }
}

/// Whole calendar days from `earlier` to `later` (negative when reversed)
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Monday of the ISO week containing `day`
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// First day of the month containing `day`
pub fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}
