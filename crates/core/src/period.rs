use chrono::{Datelike, Days, NaiveDate};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("Range starts after it ends: {0} > {1}")]
    Inverted(NaiveDate, NaiveDate),
    #[error("Date out of range: {0} days before {1}")]
    OutOfRange(u64, NaiveDate),
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} until {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PeriodError> {
        if start > end {
            return Err(PeriodError::Inverted(start, end));
        }
        Ok(DateRange { start, end })
    }

    pub fn single_day(day: NaiveDate) -> Self {
        DateRange { start: day, end: day }
    }

    /// Monday of the ISO week containing `today`, through `today`.
    pub fn week_to_date(today: NaiveDate) -> Self {
        let offset = u64::from(today.weekday().num_days_from_monday());
        let monday = today - Days::new(offset);
        DateRange { start: monday, end: today }
    }

    /// `from` days ago through `to` days ago. `to` defaults to `from`.
    pub fn days_ago(today: NaiveDate, from: u64, to: Option<u64>) -> Result<Self, PeriodError> {
        let back = |n: u64| {
            today
                .checked_sub_days(Days::new(n))
                .ok_or(PeriodError::OutOfRange(n, today))
        };
        let start = back(from)?;
        let end = back(to.unwrap_or(from))?;
        DateRange::new(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn week_to_date_starts_on_monday() {
        // 2024-01-17 is a Wednesday.
        let range = DateRange::week_to_date(d(2024, 1, 17));
        assert_eq!(range.start, d(2024, 1, 15));
        assert_eq!(range.end, d(2024, 1, 17));
    }

    #[test]
    fn week_to_date_on_monday_is_single_day() {
        let range = DateRange::week_to_date(d(2024, 1, 15));
        assert_eq!(range, DateRange::single_day(d(2024, 1, 15)));
    }

    #[test]
    fn week_to_date_on_sunday_spans_whole_week() {
        let range = DateRange::week_to_date(d(2024, 1, 21));
        assert_eq!(range.start, d(2024, 1, 15));
    }

    #[test]
    fn days_ago_single_value() {
        let range = DateRange::days_ago(d(2024, 3, 1), 1, None).unwrap();
        assert_eq!(range, DateRange::single_day(d(2024, 2, 29)));
    }

    #[test]
    fn days_ago_span() {
        let range = DateRange::days_ago(d(2024, 1, 20), 7, Some(3)).unwrap();
        assert_eq!(range.start, d(2024, 1, 13));
        assert_eq!(range.end, d(2024, 1, 17));
    }

    #[test]
    fn days_ago_rejects_inverted_span() {
        assert!(matches!(
            DateRange::days_ago(d(2024, 1, 20), 3, Some(7)),
            Err(PeriodError::Inverted(_, _))
        ));
    }

    #[test]
    fn new_rejects_inverted() {
        assert!(DateRange::new(d(2024, 2, 1), d(2024, 1, 1)).is_err());
    }

    #[test]
    fn display() {
        let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 7)).unwrap();
        assert_eq!(range.to_string(), "2024-01-01 until 2024-01-07");
    }
}
