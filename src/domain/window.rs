//! Date window used to bound a mailbox search.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Input format for window bounds, e.g. `2025/02/21`.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// Errors raised while building a [`DateWindow`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    /// The date string does not match `YYYY/MM/DD`.
    #[error("malformed date {0:?}, expected YYYY/MM/DD")]
    Malformed(String),

    /// The window ends before it starts.
    #[error("date window start {start} is after end {end}")]
    Reversed {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },
}

/// Converts a `YYYY/MM/DD` string to seconds since the Unix epoch.
///
/// The date is taken at midnight UTC.
pub fn date_to_timestamp(date: &str) -> Result<i64, WindowError> {
    parse_date(date).map(midnight_utc)
}

fn parse_date(date: &str) -> Result<NaiveDate, WindowError> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| WindowError::Malformed(date.to_string()))
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Calendar-date bounds for a search.
///
/// `start` is inclusive and `end` is exclusive, matching the provider's
/// `after:` and `before:` operators. A window with `start == end` covers that
/// one day.
///
/// Invariant: `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Creates a window, rejecting one whose start is after its end.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses a window from two `YYYY/MM/DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, WindowError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// First day of the window.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Exclusive end date as given.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Start bound in epoch seconds, for the provider's `after:` operator.
    pub fn start_timestamp(&self) -> i64 {
        midnight_utc(self.start)
    }

    /// End bound in epoch seconds, for the provider's `before:` operator.
    ///
    /// Midnight after `start` when the window is a single day.
    pub fn end_timestamp(&self) -> i64 {
        let end = if self.start == self.end {
            self.end.succ_opt().unwrap_or(self.end)
        } else {
            self.end
        };
        midnight_utc(end)
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_midnight_utc() {
        assert_eq!(date_to_timestamp("2025/02/21").unwrap(), 1_740_096_000);
        assert_eq!(date_to_timestamp("1970/01/01").unwrap(), 0);
    }

    #[test]
    fn malformed_dates_are_rejected() {
        for bad in ["2025-02-21", "21/02/2025", "2025/13/01", "", "yesterday"] {
            assert_eq!(
                date_to_timestamp(bad),
                Err(WindowError::Malformed(bad.to_string())),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn parse_window() {
        let window = DateWindow::parse("2025/02/21", "2025/02/22").unwrap();
        assert_eq!(window.start_timestamp(), 1_740_096_000);
        assert_eq!(window.end_timestamp(), 1_740_182_400);
        assert_eq!(window.to_string(), "2025/02/21..2025/02/22");
    }

    #[test]
    fn single_day_window_covers_that_day() {
        let window = DateWindow::parse("2025/02/21", "2025/02/21").unwrap();
        assert_eq!(window.start(), window.end());
        assert_eq!(window.start_timestamp(), 1_740_096_000);
        assert_eq!(window.end_timestamp(), 1_740_182_400);
    }

    #[test]
    fn reversed_window_is_rejected() {
        let err = DateWindow::parse("2025/02/22", "2025/02/21").unwrap_err();
        assert!(matches!(err, WindowError::Reversed { .. }));
    }

    #[test]
    fn malformed_end_is_reported() {
        let err = DateWindow::parse("2025/02/21", "tomorrow").unwrap_err();
        assert_eq!(err, WindowError::Malformed("tomorrow".to_string()));
    }
}
