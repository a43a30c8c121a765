//! Inclusive day count for leave requests.
//!
//! Counting is done on calendar dates. Any time-of-day part of a timestamp is
//! dropped before subtracting, so `2024-01-01T17:00` to `2024-01-02T09:00` is
//! two days, the same as the plain dates.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::PortalError;

/// Days from `start` to `end`, both included.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> Result<u32, PortalError> {
    if end < start {
        return Err(PortalError::validation(
            "start_date cannot be after end_date",
        ));
    }
    let span = end.signed_duration_since(start).num_days() + 1;
    u32::try_from(span).map_err(|_| PortalError::validation("Leave period is too long"))
}

/// Same as [`inclusive_days`] for two timestamps.
pub fn inclusive_days_between(
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<u32, PortalError> {
    inclusive_days(start.date(), end.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn five_day_week() {
        assert_eq!(inclusive_days(date(2024, 1, 1), date(2024, 1, 5)).unwrap(), 5);
    }

    #[test]
    fn same_day_is_one() {
        assert_eq!(inclusive_days(date(2024, 1, 1), date(2024, 1, 1)).unwrap(), 1);
    }

    #[test]
    fn crosses_leap_day() {
        assert_eq!(inclusive_days(date(2024, 2, 28), date(2024, 3, 1)).unwrap(), 3);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = inclusive_days(date(2024, 1, 5), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, PortalError::Validation { .. }));
    }

    #[test]
    fn time_of_day_is_ignored() {
        let start = date(2024, 1, 1).and_hms_opt(17, 30, 0).unwrap();
        let end = date(2024, 1, 5).and_hms_opt(9, 0, 0).unwrap();
        assert_eq!(inclusive_days_between(start, end).unwrap(), 5);

        let morning = date(2024, 1, 1).and_hms_opt(9, 0, 0).unwrap();
        let evening = date(2024, 1, 1).and_hms_opt(23, 59, 0).unwrap();
        assert_eq!(inclusive_days_between(morning, evening).unwrap(), 1);
    }
}
