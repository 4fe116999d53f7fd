pub mod attendance;
pub mod groups;
pub mod stats;
pub mod students;
pub mod subjects;
pub mod users;

use chrono::NaiveDate;

use crate::error::{DataError, DataResult};

/// Dates travel as `YYYY-MM-DD` strings; anything chrono rejects is invalid
/// input, including impossible calendar dates.
pub(crate) fn parse_date(s: &str) -> DataResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| DataError::InvalidInput(format!("invalid date '{}', expected YYYY-MM-DD", s)))
}

// Lesson slots are 1-4 per day.
pub(crate) fn check_lesson_number(n: i64) -> DataResult<()> {
    if !(1..=4).contains(&n) {
        return Err(DataError::InvalidInput(
            "lesson number must be between 1 and 4".to_string(),
        ));
    }
    Ok(())
}
