//! Half-open UTC date ranges on whole calendar units

use super::FieldValue;
use chrono::{DateTime, Datelike, TimeDelta, TimeZone, Utc};

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Month number (1-12) for a full English month name, case-insensitive
pub fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|m| *m == lower)
        .map(|idx| idx as u32 + 1)
}

/// Time range `[start, end)` in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Whole calendar year
    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            start: month_start(year, 1)?,
            end: month_start(year + 1, 1)?,
        })
    }

    /// Whole calendar month
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        Some(Self {
            start: month_start(year, month)?,
            end: month_start(next_year, next_month)?,
        })
    }

    /// Calendar month preceding the one containing `now`
    pub fn previous_month(now: DateTime<Utc>) -> Option<Self> {
        let (year, month) = if now.month() == 1 {
            (now.year() - 1, 12)
        } else {
            (now.year(), now.month() - 1)
        };
        Self::month(year, month)
    }

    /// `[now - days, now)`
    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> Option<Self> {
        let span = TimeDelta::try_days(days)?;
        Some(Self {
            start: now.checked_sub_signed(span)?,
            end: now,
        })
    }

    /// Inclusive lower bound in Unix seconds
    pub fn gte(&self) -> i64 {
        self.start.timestamp()
    }

    /// Exclusive upper bound in Unix seconds
    pub fn lt(&self) -> i64 {
        self.end.timestamp()
    }

    /// `{"$gte": start, "$lt": end}`
    pub fn to_field_value(&self) -> FieldValue {
        FieldValue::range(self.gte(), self.lt())
    }
}

fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_range() {
        let range = DateRange::year(2024).unwrap();
        assert_eq!(range.gte(), 1704067200);
        assert_eq!(range.lt(), 1735689600);
    }

    #[test]
    fn test_month_range() {
        let may = DateRange::month(2025, 5).unwrap();
        assert_eq!(may.gte(), 1746057600);
        assert_eq!(may.lt(), 1748736000);

        let june = DateRange::month(2023, 6).unwrap();
        assert_eq!(june.gte(), 1685577600);
        assert_eq!(june.lt(), 1688169600);
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let dec = DateRange::month(2024, 12).unwrap();
        assert_eq!(dec.lt(), DateRange::year(2025).unwrap().gte());
    }

    #[test]
    fn test_previous_month_wraps_january() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 8, 30, 0).unwrap();
        let range = DateRange::previous_month(now).unwrap();
        assert_eq!(range, DateRange::month(2025, 12).unwrap());
    }

    #[test]
    fn test_trailing_days() {
        let now = Utc.with_ymd_and_hms(2025, 7, 8, 0, 0, 0).unwrap();
        let range = DateRange::trailing_days(now, 15).unwrap();
        assert_eq!(range.gte(), 1750636800);
        assert_eq!(range.lt(), 1751932800);
    }

    #[test]
    fn test_trailing_days_overflow() {
        let now = Utc::now();
        assert!(DateRange::trailing_days(now, i64::MAX).is_none());
    }

    #[test]
    fn test_invalid_month() {
        assert!(DateRange::month(2025, 13).is_none());
        assert_eq!(month_from_name("May"), Some(5));
        assert_eq!(month_from_name("Smarch"), None);
    }
}
