#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report store interface and adapters.
//!
//! The aggregation engine never owns report data: every operation re-queries
//! a [`ReportStore`] so that reports deleted or ingested by other processes
//! are picked up on the next request. Store methods are per-node; a query
//! for a main branch does not include the reports of its children.
//!
//! Two adapters are provided:
//!
//! - [`memory::MemoryStore`]: an in-process snapshot loaded from a JSON
//!   dataset file, backed by an arena [`LocationTree`].
//! - [`http::HttpReportStore`]: a JSON-over-HTTP client for the dashboard
//!   backend, with retry on transient failures.
//!
//! [`LocationTree`]: safety_map_location_models::LocationTree

pub mod http;
pub mod memory;
pub mod retry;

use async_trait::async_trait;
use safety_map_location_models::{HierarchyError, Location, LocationId};
use safety_map_report_models::{DateRange, MonthKey, Report};
use thiserror::Error;

/// Errors raised by a [`ReportStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The backend response could not be decoded.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of what went wrong.
        message: String,
    },

    /// Dataset file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Dataset locations do not form a valid hierarchy.
    #[error("Invalid hierarchy: {0}")]
    Hierarchy(#[from] HierarchyError),

    /// A dataset report refers to a location that does not exist.
    #[error("Report {report_id} refers to unknown location {location_id}")]
    UnknownLocation {
        /// Offending report.
        report_id: String,
        /// Location it refers to.
        location_id: LocationId,
    },
}

impl StoreError {
    /// HTTP status of the failure, if the backend answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Read-only query surface over locations and their reports.
///
/// All report queries are scoped to exactly one location and return
/// reports in an unspecified order. `range` is an already-validated
/// inclusive filter; `None` means all time.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Looks up a single location.
    async fn get_location(&self, id: &LocationId) -> Result<Option<Location>, StoreError>;

    /// Lists all main branches.
    async fn main_branches(&self) -> Result<Vec<Location>, StoreError>;

    /// Lists the direct children of a main branch, each tagged with its
    /// own level. The order is the store's natural order.
    async fn query_children(&self, main_branch_id: &LocationId)
    -> Result<Vec<Location>, StoreError>;

    /// Reports attributed to `location_id`, optionally filtered by date.
    async fn query_reports(
        &self,
        location_id: &LocationId,
        range: Option<&DateRange>,
    ) -> Result<Vec<Report>, StoreError>;

    /// Reports attributed to `location_id` within `month`, intersected
    /// with `range` when one is given.
    async fn query_reports_by_month(
        &self,
        location_id: &LocationId,
        month: MonthKey,
        range: Option<&DateRange>,
    ) -> Result<Vec<Report>, StoreError> {
        let reports = self.query_reports(location_id, range).await?;
        Ok(reports
            .into_iter()
            .filter(|r| month.contains(r.report_date.date))
            .collect())
    }

    /// Reports attributed to `location_id` whose category equals
    /// `category` exactly, optionally filtered by date.
    async fn query_reports_by_category(
        &self,
        location_id: &LocationId,
        category: &str,
        range: Option<&DateRange>,
    ) -> Result<Vec<Report>, StoreError> {
        let reports = self.query_reports(location_id, range).await?;
        Ok(reports
            .into_iter()
            .filter(|r| r.category == category)
            .collect())
    }

    /// Number of reports attributed to `location_id`.
    async fn report_count(
        &self,
        location_id: &LocationId,
        range: Option<&DateRange>,
    ) -> Result<u64, StoreError> {
        let reports = self.query_reports(location_id, range).await?;
        Ok(reports.len() as u64)
    }
}
