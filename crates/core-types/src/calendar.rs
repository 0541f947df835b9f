use crate::error::CoreError;
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar month, the join key between the security panel and the reference series.
///
/// Ordering is chronological because `year` is compared before `month`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, CoreError> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::InvalidMonth { year, month });
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Linear month number (`year * 12 + month`). Two months are adjacent
    /// exactly when their indices differ by one.
    pub fn index(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Returns the last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        // Only reachable in the final representable month.
        .unwrap_or(NaiveDate::MAX)
}

/// The inclusive historical window every fetch is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SampleWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_end_handles_leap_years_and_december() {
        assert_eq!(month_end(date(2020, 2, 3)), date(2020, 2, 29));
        assert_eq!(month_end(date(2021, 2, 28)), date(2021, 2, 28));
        assert_eq!(month_end(date(1999, 12, 1)), date(1999, 12, 31));
        assert_eq!(month_end(date(1926, 1, 30)), date(1926, 1, 31));
    }

    #[test]
    fn adjacent_months_differ_by_one_index() {
        let dec = MonthKey::new(1999, 12).unwrap();
        let jan = MonthKey::new(2000, 1).unwrap();
        assert_eq!(jan.index() - dec.index(), 1);
        assert!(dec < jan);
    }

    #[test]
    fn rejects_out_of_range_month() {
        assert_eq!(
            MonthKey::new(2000, 13),
            Err(CoreError::InvalidMonth { year: 2000, month: 13 })
        );
    }

    #[test]
    fn window_is_inclusive_and_ordered() {
        let window = SampleWindow::new(date(1926, 1, 1), date(2022, 12, 31)).unwrap();
        assert!(window.contains(date(1926, 1, 1)));
        assert!(window.contains(date(2022, 12, 31)));
        assert!(!window.contains(date(2023, 1, 31)));
        assert!(SampleWindow::new(date(2000, 1, 1), date(1999, 1, 1)).is_err());
    }

    #[test]
    fn month_key_displays_zero_padded() {
        assert_eq!(MonthKey::new(1926, 7).unwrap().to_string(), "1926-07");
    }
}
