//! Inclusive date ranges and the dashboard presets.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Inclusive `[start, end]` range of work dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateRange {
    /// First included date.
    #[schema(value_type = String, format = Date)]
    pub start: NaiveDate,
    /// Last included date.
    #[schema(value_type = String, format = Date)]
    pub end: NaiveDate,
}

impl DateRange {
    /// Range from `start` to `end`. An inverted range is allowed and empty.
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Exactly one day.
    #[must_use]
    pub const fn single_day(day: NaiveDate) -> Self {
        Self::new(day, day)
    }

    /// The `days` days ending at `end`, both inclusive. Zero is treated as
    /// one day.
    #[must_use]
    pub fn last_days(end: NaiveDate, days: u32) -> Self {
        let back = i64::from(days.max(1)) - 1;
        Self::new(shift_date(end, -back), end)
    }

    /// From the Monday of `today`'s week through `today`.
    #[must_use]
    pub fn week_to_date(today: NaiveDate) -> Self {
        let offset = i64::from(today.weekday().num_days_from_monday());
        Self::new(shift_date(today, -offset), today)
    }

    /// From the first of `today`'s month through `today`.
    #[must_use]
    pub fn month_to_date(today: NaiveDate) -> Self {
        Self::new(today.with_day(1).unwrap_or(today), today)
    }

    /// Whether `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Whether the range selects no dates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Move both bounds by `days`.
    #[must_use]
    pub fn shift(self, days: i64) -> Self {
        Self::new(shift_date(self.start, days), shift_date(self.end, days))
    }
}

/// Move `date` by `days`, saturating at the calendar limits.
#[must_use]
pub fn shift_date(date: NaiveDate, days: i64) -> NaiveDate {
    let fallback = if days < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    };
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(fallback)
}
