#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Safety report records and the date primitives used to filter them.
//!
//! A [`Report`] is attributed to one concrete location in the branch
//! hierarchy. Filtering works at day granularity through [`DateRange`];
//! trend bucketing works at month granularity through [`MonthKey`].

pub mod date;
pub mod month;

use safety_map_location_models::LocationId;
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use date::{
    DateRange, InvalidDateError, InvalidDateRangeError, ReportTimestamp, in_range, parse_date,
};
pub use month::{InvalidMonthLabelError, MonthKey, MonthLocale};

/// Opaque unique identifier of a [`Report`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawReportId", into = "String")]
pub struct ReportId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReportId {
    Text(String),
    Number(i64),
}

impl From<RawReportId> for ReportId {
    fn from(value: RawReportId) -> Self {
        match value {
            RawReportId::Text(text) => Self(text),
            RawReportId::Number(number) => Self(number.to_string()),
        }
    }
}

impl From<ReportId> for String {
    fn from(value: ReportId) -> Self {
        value.0
    }
}

impl ReportId {
    /// Creates a report id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A safety incident report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Unique report id.
    pub id: ReportId,
    /// The location the report is attributed to.
    #[serde(alias = "location_id", alias = "airport_id")]
    pub location_id: LocationId,
    /// Free-form category (e.g. "Bird Strike"). Empty when missing or null.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
    /// When the incident was reported.
    #[serde(alias = "report_date")]
    pub report_date: ReportTimestamp,
    /// Workflow status label (e.g. "Open"). Opaque for filtering.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
    /// Incident description.
    #[serde(default)]
    pub description: Option<String>,
    /// Free-text place of the incident within the location.
    #[serde(default)]
    pub location: Option<String>,
    /// Attachment reference, if evidence was uploaded.
    #[serde(default)]
    pub evidence: Option<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Report {
    /// The category, or `None` when it is empty or whitespace.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        let category = self.category.trim();
        if category.is_empty() {
            None
        } else {
            Some(&self.category)
        }
    }

    /// Display color for the report's status.
    #[must_use]
    pub fn status_color(&self) -> StatusColor {
        StatusColor::for_status(&self.status)
    }
}

/// Semantic display color of a report status.
///
/// Statuses are open-ended strings; the known workflow labels map to a
/// fixed color and anything else is gray. Used for display only.
#[derive(
    Debug,
    Clone,
    Copy,
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
pub enum StatusColor {
    /// Newly opened, not yet handled.
    Red,
    /// Being analysed.
    Amber,
    /// Forwarded to an analyst.
    Blue,
    /// Analysis finished.
    Green,
    /// Unrecognized status.
    Gray,
}

impl StatusColor {
    /// Maps a status label to its color, ignoring case and surrounding
    /// whitespace.
    #[must_use]
    pub fn for_status(status: &str) -> Self {
        match status.trim().to_lowercase().as_str() {
            "open" => Self::Red,
            "send to analyst" | "sent to analyst" => Self::Blue,
            "analysis on process" | "in process" | "in progress" => Self::Amber,
            "analysis completed" | "completed" | "closed" => Self::Green,
            _ => Self::Gray,
        }
    }
}
