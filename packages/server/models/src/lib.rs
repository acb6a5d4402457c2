#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the safety map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the engine types to allow independent evolution of the API
//! contract.

use safety_map_analytics_models::{AggregatedStats, CategoryCount, TrendPoint, WindowMode};
use safety_map_location_models::{Coordinates, Location, LocationId, LocationLevel};
use safety_map_report_models::{Report, StatusColor};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable error kind, e.g. `"not_found"`.
    pub kind: String,
}

/// A main branch as placed on the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLocationSummary {
    /// Location id.
    pub id: LocationId,
    /// Display name.
    pub name: String,
    /// City.
    pub city: String,
    /// Province.
    pub province: String,
    /// Hierarchy level.
    pub level: LocationLevel,
    /// Badge text for the level.
    pub badge: String,
    /// Marker position.
    pub coordinates: Option<Coordinates>,
    /// All-time reports of the branch and its children.
    pub total_reports: u64,
    /// Whether the branch has sub-branches or units.
    pub has_children: bool,
}

impl ApiLocationSummary {
    /// Builds a summary from a location and its aggregated counts.
    #[must_use]
    pub fn new(location: Location, total_reports: u64, has_children: bool) -> Self {
        Self {
            badge: location.level.badge().to_string(),
            id: location.id,
            name: location.name,
            city: location.city,
            province: location.province,
            level: location.level,
            coordinates: location.coordinates,
            total_reports,
            has_children,
        }
    }
}

/// Statistics response: the engine's figures plus display helpers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStats {
    /// Raw statistics.
    #[serde(flatten)]
    pub stats: AggregatedStats,
    /// Categories by count descending.
    pub ranked_categories: Vec<CategoryCount>,
    /// Window applied to `display_trend`.
    pub window: WindowMode,
    /// Trend bars to display.
    pub display_trend: Vec<TrendPoint>,
}

/// A report as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReport {
    /// Report id.
    pub id: String,
    /// Location the report is attributed to.
    pub location_id: LocationId,
    /// Category, possibly empty.
    pub category: String,
    /// `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.
    pub report_date: String,
    /// Workflow status.
    pub status: String,
    /// Display color of `status`.
    pub status_color: StatusColor,
    /// Incident description.
    pub description: Option<String>,
    /// Place within the location.
    pub location: Option<String>,
    /// Attachment reference.
    pub evidence: Option<String>,
}

impl From<Report> for ApiReport {
    fn from(report: Report) -> Self {
        Self {
            status_color: report.status_color(),
            id: report.id.to_string(),
            location_id: report.location_id,
            category: report.category,
            report_date: report.report_date.to_string(),
            status: report.status,
            description: report.description,
            location: report.location,
            evidence: report.evidence,
        }
    }
}

/// Query parameters for the stats endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQueryParams {
    /// Range start (`YYYY-MM-DD`). Ignored without `end_date`.
    pub start_date: Option<String>,
    /// Range end (`YYYY-MM-DD`). Ignored without `start_date`.
    pub end_date: Option<String>,
    /// Quick-filter window for `displayTrend`.
    pub window: Option<WindowMode>,
}

/// Query parameters for the reports endpoint. Exactly one of `month` and
/// `category` is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQueryParams {
    /// `YYYY-MM` or a chart label such as `Jan 2024`.
    pub month: Option<String>,
    /// Exact category.
    pub category: Option<String>,
    /// Range start (`YYYY-MM-DD`). Ignored without `end_date`.
    pub start_date: Option<String>,
    /// Range end (`YYYY-MM-DD`). Ignored without `start_date`.
    pub end_date: Option<String>,
}
