//! Report timestamps and inclusive date ranges.

use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Earliest year a report date may carry.
pub const MIN_YEAR: i32 = 0;
/// Latest year a report date may carry. Keeps every month label four digits.
pub const MAX_YEAR: i32 = 9999;

/// Timestamp formats accepted from report sources, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// When a report happened.
///
/// Filtering and bucketing only look at [`date`](Self::date). The time of
/// day is kept when the source record carries one so it can be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReportTimestamp {
    /// Calendar date of the report.
    pub date: NaiveDate,
    /// Time of day, if the source recorded one.
    pub time: Option<NaiveTime>,
}

impl ReportTimestamp {
    /// A timestamp with day granularity only.
    #[must_use]
    pub const fn from_date(date: NaiveDate) -> Self {
        Self { date, time: None }
    }

    /// A timestamp carrying a time of day.
    #[must_use]
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Self {
            date: datetime.date(),
            time: Some(datetime.time()),
        }
    }

    /// Parses `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]`, the `T`-separated
    /// variants, or an RFC 3339 timestamp (kept in its own offset).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDateError`] if no accepted format matches.
    pub fn parse(s: &str) -> Result<Self, InvalidDateError> {
        let s = s.trim();
        let err = || InvalidDateError {
            value: s.to_string(),
        };

        let timestamp = if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Self::from_date(date)
        } else if let Some(datetime) = DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        {
            Self::from_datetime(datetime)
        } else {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| Self::from_datetime(dt.naive_local()))
                .map_err(|_| err())?
        };

        if has_supported_year(timestamp.date) {
            Ok(timestamp)
        } else {
            Err(err())
        }
    }
}

impl std::fmt::Display for ReportTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.time {
            Some(time) => write!(f, "{} {}", self.date, time.format("%H:%M:%S")),
            None => write!(f, "{}", self.date),
        }
    }
}

impl TryFrom<String> for ReportTimestamp {
    type Error = InvalidDateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReportTimestamp> for String {
    fn from(value: ReportTimestamp) -> Self {
        value.to_string()
    }
}

/// Parses a `YYYY-MM-DD` date, as used by date-range query parameters.
///
/// # Errors
///
/// Returns [`InvalidDateError`] if the string is not a valid calendar date
/// or its year is outside [`MIN_YEAR`]..=[`MAX_YEAR`].
pub fn parse_date(s: &str) -> Result<NaiveDate, InvalidDateError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()
        .filter(|date| has_supported_year(*date))
        .ok_or_else(|| InvalidDateError {
            value: s.to_string(),
        })
}

fn has_supported_year(date: NaiveDate) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&date.year())
}

/// Error returned when a date or timestamp string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDateError {
    /// The rejected input.
    pub value: String,
}

impl std::fmt::Display for InvalidDateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid date '{}': expected YYYY-MM-DD", self.value)
    }
}

impl std::error::Error for InvalidDateError {}

/// An inclusive `[start, end]` date filter with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDateRange")]
pub struct DateRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDateRange {
    #[serde(alias = "start_date")]
    start_date: NaiveDate,
    #[serde(alias = "end_date")]
    end_date: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = InvalidDateRangeError;

    fn try_from(value: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(value.start_date, value.end_date)
    }
}

impl DateRange {
    /// Creates a range.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDateRangeError`] if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidDateRangeError> {
        if start > end {
            return Err(InvalidDateRangeError { start, end });
        }
        Ok(Self {
            start_date: start,
            end_date: end,
        })
    }

    /// Builds the active filter from two optional bounds.
    ///
    /// Both bounds are required for a filter: if either one is missing the
    /// result is `Ok(None)`, meaning "no filter", rather than a one-sided
    /// range.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDateRangeError`] if both bounds are present and
    /// `start` is after `end`.
    pub fn from_bounds(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Option<Self>, InvalidDateRangeError> {
        match (start, end) {
            (Some(start), Some(end)) => Self::new(start, end).map(Some),
            _ => Ok(None),
        }
    }

    /// First day of the range.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start_date
    }

    /// Last day of the range (inclusive).
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end_date
    }

    /// Whether `date` lies inside the range, bounds included.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// The overlap of two ranges, or `None` if they are disjoint.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let start = self.start_date.max(other.start_date);
        let end = self.end_date.min(other.end_date);
        Self::new(start, end).ok()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start_date, self.end_date)
    }
}

/// Returns `true` when `date` passes the optional filter.
#[must_use]
pub fn in_range(range: Option<&DateRange>, date: NaiveDate) -> bool {
    range.is_none_or(|r| r.contains(date))
}

/// Error returned when a date range starts after it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidDateRangeError {
    /// Requested start date.
    pub start: NaiveDate,
    /// Requested end date.
    pub end: NaiveDate,
}

impl std::fmt::Display for InvalidDateRangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid date range: start {} is after end {}",
            self.start, self.end
        )
    }
}

impl std::error::Error for InvalidDateRangeError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn years_must_have_four_digits() {
        assert_eq!(date("0999-01-15").to_string(), "0999-01-15");
        assert_eq!(
            ReportTimestamp::parse("9999-12-31 23:59:59").unwrap().date,
            date("9999-12-31")
        );
        for value in ["+10000-01-15", "-0001-01-15", "+10000-01-15 08:00:00"] {
            assert!(ReportTimestamp::parse(value).is_err(), "{value}");
        }
        assert!(parse_date("+10000-01-15").is_err());
    }

    #[test]
    fn lone_bound_means_no_filter() {
        assert_eq!(DateRange::from_bounds(Some(date("2024-01-01")), None), Ok(None));
        assert_eq!(DateRange::from_bounds(None, Some(date("2024-01-01"))), Ok(None));
        assert_eq!(DateRange::from_bounds(None, None), Ok(None));
    }

    #[test]
    fn rejects_inverted_range() {
        let err = DateRange::from_bounds(Some(date("2024-03-01")), Some(date("2024-02-01")))
            .unwrap_err();
        assert_eq!(err.start, date("2024-03-01"));
    }

    #[test]
    fn single_day_range_is_inclusive() {
        let range = DateRange::new(date("2024-02-15"), date("2024-02-15")).unwrap();
        assert!(range.contains(date("2024-02-15")));
        assert!(!range.contains(date("2024-02-16")));
        assert!(in_range(None, date("1999-01-01")));
    }

    #[test]
    fn intersection_of_overlapping_and_disjoint_ranges() {
        let a = DateRange::new(date("2024-01-10"), date("2024-02-20")).unwrap();
        let b = DateRange::new(date("2024-02-01"), date("2024-03-01")).unwrap();
        let overlap = a.intersection(&b).unwrap();
        assert_eq!(overlap.start(), date("2024-02-01"));
        assert_eq!(overlap.end(), date("2024-02-20"));

        let c = DateRange::new(date("2025-01-01"), date("2025-01-02")).unwrap();
        assert!(a.intersection(&c).is_none());
    }

    #[test]
    fn deserialize_validates_order() {
        let ok: DateRange = serde_json::from_value(serde_json::json!({
            "start_date": "2024-01-01",
            "endDate": "2024-01-31"
        }))
        .unwrap();
        assert_eq!(ok.end(), date("2024-01-31"));

        let bad = serde_json::from_value::<DateRange>(serde_json::json!({
            "startDate": "2024-02-01",
            "endDate": "2024-01-31"
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn timestamp_keeps_time_of_day() {
        let ts = ReportTimestamp::parse("2024-03-05 14:30:00").unwrap();
        assert_eq!(ts.date, date("2024-03-05"));
        assert_eq!(ts.to_string(), "2024-03-05 14:30:00");

        let day = ReportTimestamp::parse("2024-03-05").unwrap();
        assert_eq!(day.time, None);
        assert_eq!(day.to_string(), "2024-03-05");

        let iso = ReportTimestamp::parse("2024-03-05T23:10:00+07:00").unwrap();
        assert_eq!(iso.date, date("2024-03-05"));

        assert!(ReportTimestamp::parse("05/03/2024").is_err());
    }
}
