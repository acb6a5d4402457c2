//! Calendar month keys and their display labels.
//!
//! Trend buckets are keyed by [`MonthKey`] and shown as `"{Mon} {YYYY}"`
//! labels (e.g. `"Jan 2024"`). A label must convert back to exactly the key
//! it was produced from, so parsing goes through an explicit table of month
//! abbreviations and rejects anything not in it.

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::date::{DateRange, MAX_YEAR, MIN_YEAR};

const ENGLISH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const INDONESIAN_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

/// Every abbreviation accepted when parsing a label, with its month number.
const MONTH_NAMES: &[(&str, u32)] = &[
    ("Jan", 1),
    ("Feb", 2),
    ("Mar", 3),
    ("Apr", 4),
    ("May", 5),
    ("Mei", 5),
    ("Jun", 6),
    ("Jul", 7),
    ("Aug", 8),
    ("Agu", 8),
    ("Agt", 8),
    ("Sep", 9),
    ("Oct", 10),
    ("Okt", 10),
    ("Nov", 11),
    ("Dec", 12),
    ("Des", 12),
];

/// Language used for month labels.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MonthLocale {
    /// `Jan`, `May`, `Aug`, `Oct`, `Dec`, ...
    #[default]
    English,
    /// `Jan`, `Mei`, `Agu`, `Okt`, `Des`, ...
    Indonesian,
}

impl MonthLocale {
    const fn abbreviations(self) -> &'static [&'static str; 12] {
        match self {
            Self::English => &ENGLISH_ABBREVIATIONS,
            Self::Indonesian => &INDONESIAN_ABBREVIATIONS,
        }
    }
}

/// A `(year, month)` bucket key. Orders chronologically.
///
/// Years are limited to [`MIN_YEAR`]..=[`MAX_YEAR`] so both the canonical
/// form and the display label carry exactly four year digits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Creates a key, returning `None` if `month` is not in `1..=12` or
    /// `year` is outside [`MIN_YEAR`]..=[`MAX_YEAR`].
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Option<Self> {
        if month >= 1 && month <= 12 && year >= MIN_YEAR && year <= MAX_YEAR {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month a date falls in. Dates from [`ReportTimestamp`] and
    /// [`parse_date`] always have a supported year.
    ///
    /// [`ReportTimestamp`]: crate::date::ReportTimestamp
    /// [`parse_date`]: crate::date::parse_date
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Month number, `1..=12`.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// First through last day of the month.
    ///
    /// Returns `None` only for years outside the supported calendar.
    #[must_use]
    pub fn date_range(self) -> Option<DateRange> {
        let first = NaiveDate::from_ymd_opt(self.year, self.month, 1)?;
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)?
        };
        DateRange::new(first, next.pred_opt()?).ok()
    }

    /// Whether `date` falls inside this month.
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Display label such as `"Jan 2024"` (or `"Mei 2024"` in Indonesian).
    #[must_use]
    pub fn label(self, locale: MonthLocale) -> String {
        let name = locale.abbreviations()[(self.month - 1) as usize];
        format!("{name} {:04}", self.year)
    }

    /// Converts a display label back into its key.
    ///
    /// Accepts English and Indonesian three-letter abbreviations (ASCII
    /// case-insensitive) followed by a four-digit year.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidMonthLabelError`] if the label is not exactly a
    /// known abbreviation and a year. Unknown names are never mapped to a
    /// default month.
    pub fn from_label(label: &str) -> Result<Self, InvalidMonthLabelError> {
        let err = || InvalidMonthLabelError {
            label: label.to_string(),
        };

        let mut parts = label.split_whitespace();
        let (Some(name), Some(year), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(err());
        };

        let month = MONTH_NAMES
            .iter()
            .find(|(abbr, _)| abbr.eq_ignore_ascii_case(name))
            .map(|&(_, month)| month)
            .ok_or_else(err)?;

        let year = parse_year(year).ok_or_else(err)?;
        Ok(Self { year, month })
    }

    /// Parses either the canonical `YYYY-MM` form or a display label.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidMonthLabelError`] if neither form matches.
    pub fn parse(input: &str) -> Result<Self, InvalidMonthLabelError> {
        input.trim().parse().or_else(|_| Self::from_label(input))
    }
}

fn parse_year(s: &str) -> Option<i32> {
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for MonthKey {
    type Err = InvalidMonthLabelError;

    /// Parses the canonical `YYYY-MM` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InvalidMonthLabelError {
            label: s.to_string(),
        };
        let (year, month) = s.split_once('-').ok_or_else(err)?;
        if month.len() != 2 || !month.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let year = parse_year(year).ok_or_else(err)?;
        let month: u32 = month.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = InvalidMonthLabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.to_string()
    }
}

/// Error returned when a month label or key cannot be converted to a
/// [`MonthKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMonthLabelError {
    /// The rejected input.
    pub label: String,
}

impl std::fmt::Display for InvalidMonthLabelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid month label '{}': expected e.g. 'Jan 2024' or '2024-01'",
            self.label
        )
    }
}

impl std::error::Error for InvalidMonthLabelError {}
