//! Weekly calendar — the time axis shared by every series.
//!
//! Weeks end on Sunday. The first week-ending is the first Sunday on or
//! after the configured start date; later points step exactly 7 days and
//! stop at the last Sunday on or before the end date.

use crate::types::WeekIndex;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    weeks: Vec<NaiveDate>,
}

impl Calendar {
    pub fn weekly(start: NaiveDate, end: NaiveDate) -> Self {
        let mut weeks = Vec::new();
        let mut current = week_ending(start);
        while current <= end {
            weeks.push(current);
            current += Duration::days(7);
        }
        Self { weeks }
    }

    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn week(&self, index: WeekIndex) -> Option<NaiveDate> {
        self.weeks.get(index).copied()
    }

    pub fn weeks(&self) -> &[NaiveDate] {
        &self.weeks
    }
}

/// Roll a date forward to its week-ending Sunday. Sundays map to themselves.
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    let days_to_sunday = (7 - date.weekday().num_days_from_sunday()) % 7;
    date + Duration::days(i64::from(days_to_sunday))
}

pub fn is_week_ending(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn default_range_has_104_sundays() {
        let cal = Calendar::weekly(d(2023, 1, 1), d(2024, 12, 28));
        assert_eq!(cal.len(), 104);
        assert_eq!(cal.week(0), Some(d(2023, 1, 1)));
        assert_eq!(cal.week(103), Some(d(2024, 12, 22)));
        assert!(cal.weeks().iter().all(|w| is_week_ending(*w)));
    }

    #[test]
    fn midweek_start_rolls_forward() {
        assert_eq!(week_ending(d(2023, 1, 4)), d(2023, 1, 8));
        assert_eq!(week_ending(d(2023, 1, 7)), d(2023, 1, 8));
        assert_eq!(week_ending(d(2023, 1, 8)), d(2023, 1, 8));
    }

    #[test]
    fn end_before_first_sunday_is_empty() {
        let cal = Calendar::weekly(d(2023, 1, 2), d(2023, 1, 5));
        assert!(cal.is_empty());
        assert_eq!(cal.week(0), None);
    }
}
