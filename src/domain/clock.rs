//! Business-day computation.
//!
//! The "one order per area per day" rule is evaluated against a single
//! business calendar. Every component that needs "today" or the day an order
//! belongs to asks a [`BusinessClock`] instead of reading the system clock.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// Offset of the default business calendar (UTC-5, Lima).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -300;

pub trait BusinessClock: Send + Sync + 'static {
    /// Offset of the business calendar.
    fn offset(&self) -> FixedOffset;

    /// Current instant.
    fn now_utc(&self) -> DateTime<Utc>;

    fn now(&self) -> DateTime<FixedOffset> {
        self.now_utc().with_timezone(&self.offset())
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Business date an instant falls on.
    fn business_date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset()).date_naive()
    }
}

/// Wall clock in a fixed business offset.
#[derive(Debug, Clone, Copy)]
pub struct OffsetClock {
    offset: FixedOffset,
}

impl OffsetClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Returns `None` when the offset is out of range (more than a day).
    pub fn from_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(Self::new)
    }
}

impl Default for OffsetClock {
    fn default() -> Self {
        Self::new(
            FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60).unwrap_or_else(|| Utc.fix()),
        )
    }
}

impl BusinessClock for OffsetClock {
    fn offset(&self) -> FixedOffset {
        self.offset
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant; used for reports over a fixed day and in tests.
#[derive(Debug, Clone, Copy)]
pub struct FrozenClock {
    at: DateTime<Utc>,
    offset: FixedOffset,
}

impl FrozenClock {
    pub fn new(at: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { at, offset }
    }
}

impl BusinessClock for FrozenClock {
    fn offset(&self) -> FixedOffset {
        self.offset
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.at
    }
}

/// Parses a `YYYY-MM-DD` business date.
pub fn parse_business_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}
