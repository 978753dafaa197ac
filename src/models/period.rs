//! Inclusive date ranges.
//!
//! Payroll periods and leave spans are both inclusive `[start, end]` ranges of
//! calendar days. This module contains the [`Period`] type and the overlap and
//! clipping rules both workflows share.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// An inclusive range of calendar days.
///
/// # Example
///
/// ```
/// use payroll_engine::models::Period;
/// use chrono::NaiveDate;
///
/// let january = Period::new(
///     NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
/// );
///
/// assert_eq!(january.days(), 31);
/// assert!(january.contains_date(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    /// First day (inclusive).
    pub start: NaiveDate,
    /// Last day (inclusive).
    pub end: NaiveDate,
}

impl Period {
    /// Creates a period. Callers validate `start <= end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The calendar month before the one containing `today`.
    ///
    /// ```
    /// use payroll_engine::models::Period;
    /// use chrono::NaiveDate;
    ///
    /// let period = Period::previous_month(NaiveDate::from_ymd_opt(2026, 3, 5).unwrap());
    /// assert_eq!(period.start, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
    /// assert_eq!(period.end, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
    /// ```
    pub fn previous_month(today: NaiveDate) -> Self {
        use chrono::Datelike;

        let first_of_this_month = today.with_day(1).unwrap_or(today);
        let end = first_of_this_month - Duration::days(1);
        let start = end.with_day(1).unwrap_or(end);
        Self { start, end }
    }

    /// Returns true if `start <= end`.
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// Checks if a given date falls within this period, bounds included.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Returns true if this period fully contains `other`.
    pub fn encloses(&self, other: &Period) -> bool {
        self.start <= other.start && self.end >= other.end
    }

    /// Inclusive overlap test: `self.start <= other.end && self.end >= other.start`.
    pub fn overlaps(&self, other: &Period) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    /// Number of calendar days in the range, counting both ends.
    ///
    /// Always at least 1 for a valid period.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The part of this period that falls inside `bounds`, if any.
    pub fn clip_to(&self, bounds: &Period) -> Option<Period> {
        if !self.overlaps(bounds) {
            return None;
        }
        Some(Period {
            start: self.start.max(bounds.start),
            end: self.end.min(bounds.end),
        })
    }

    /// Iterates every day of the period in order.
    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start
            .iter_days()
            .take_while(move |day| *day <= self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_single_day_period_has_one_day() {
        let period = Period::new(date(2026, 2, 10), date(2026, 2, 10));
        assert_eq!(period.days(), 1);
        assert_eq!(period.iter_days().count(), 1);
    }

    #[test]
    fn test_overlap_is_inclusive_on_bounds() {
        let a = Period::new(date(2026, 1, 1), date(2026, 1, 31));
        let b = Period::new(date(2026, 1, 31), date(2026, 2, 28));
        let c = Period::new(date(2026, 2, 1), date(2026, 2, 28));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_clip_to_bounds() {
        let leave = Period::new(date(2026, 1, 28), date(2026, 2, 3));
        let january = Period::new(date(2026, 1, 1), date(2026, 1, 31));
        let clipped = leave.clip_to(&january).unwrap();
        assert_eq!(clipped, Period::new(date(2026, 1, 28), date(2026, 1, 31)));
        assert_eq!(clipped.days(), 4);

        let march = Period::new(date(2026, 3, 1), date(2026, 3, 31));
        assert!(leave.clip_to(&march).is_none());
    }

    #[test]
    fn test_encloses() {
        let january = Period::new(date(2026, 1, 1), date(2026, 1, 31));
        assert!(january.encloses(&Period::new(date(2026, 1, 5), date(2026, 1, 7))));
        assert!(!january.encloses(&Period::new(date(2026, 1, 30), date(2026, 2, 2))));
    }

    #[test]
    fn test_previous_month_handles_january() {
        let period = Period::previous_month(date(2026, 1, 5));
        assert_eq!(period, Period::new(date(2025, 12, 1), date(2025, 12, 31)));
    }

    #[test]
    fn test_previous_month_handles_leap_february() {
        let period = Period::previous_month(date(2028, 3, 5));
        assert_eq!(period.end, date(2028, 2, 29));
    }

    proptest! {
        #[test]
        fn prop_days_is_at_least_one(offset in 0i64..2000, len in 0i64..400) {
            let start = date(2024, 1, 1) + Duration::days(offset);
            let period = Period::new(start, start + Duration::days(len));
            prop_assert_eq!(period.days(), len + 1);
            prop_assert!(period.days() >= 1);
            prop_assert_eq!(period.iter_days().count() as i64, period.days());
        }

        #[test]
        fn prop_overlap_is_symmetric(a in 0i64..100, al in 0i64..30, b in 0i64..100, bl in 0i64..30) {
            let base = date(2026, 1, 1);
            let p = Period::new(base + Duration::days(a), base + Duration::days(a + al));
            let q = Period::new(base + Duration::days(b), base + Duration::days(b + bl));
            prop_assert_eq!(p.overlaps(&q), q.overlaps(&p));
            prop_assert_eq!(p.overlaps(&q), p.clip_to(&q).is_some());
        }
    }
}
