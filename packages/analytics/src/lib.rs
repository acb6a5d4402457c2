#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hierarchical report aggregation engine.
//!
//! Every operation is a stateless async function over a borrowed
//! [`ReportStore`]: nothing is cached between calls, so each result
//! reflects the store at call time.
//!
//! Only main branches aggregate. The *scope* of a main branch is the
//! branch itself plus every child the store lists for it; the scope of a
//! sub-branch or unit is that node alone.

pub mod detail;
pub mod hierarchy;
pub mod session;
pub mod stats;
pub mod trend;

#[cfg(test)]
mod fixtures;

use futures::future::try_join_all;
use safety_map_location_models::{Location, LocationId, LocationLevel};
use safety_map_report_models::{InvalidDateRangeError, InvalidMonthLabelError, Report};
use safety_map_store::{ReportStore, StoreError};
use thiserror::Error;

pub use detail::{resolve_by_category, resolve_by_month, resolve_by_month_label};
pub use hierarchy::{compute_hierarchy, map_rollups};
pub use session::{RequestSequencer, RequestTicket, Sequenced, StatsSession};
pub use stats::{compute_stats, compute_stats_localized};
pub use trend::window_trend;

/// Errors that can occur during aggregation.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The location does not exist.
    #[error("Location not found: {id}")]
    NotFound {
        /// Requested location.
        id: LocationId,
    },

    /// The operation does not apply to the location.
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of what went wrong.
        message: String,
    },

    /// A date range starts after it ends.
    #[error(transparent)]
    InvalidDateRange(#[from] InvalidDateRangeError),

    /// A month label is not in the month-name table.
    #[error(transparent)]
    InvalidMonthLabel(#[from] InvalidMonthLabelError),

    /// The report store failed.
    #[error("Report store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

/// The set of locations whose reports are counted for one selection.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    pub location: Location,
    pub members: Vec<LocationId>,
}

impl Scope {
    /// Looks up `id` and expands it to its aggregation scope.
    pub async fn resolve(
        store: &dyn ReportStore,
        id: &LocationId,
    ) -> Result<Self, AnalyticsError> {
        let location = find_location(store, id).await?;

        let members = match location.level {
            LocationLevel::MainBranch => {
                let children = store.query_children(&location.id).await?;
                std::iter::once(location.id.clone())
                    .chain(children.into_iter().map(|child| child.id))
                    .collect()
            }
            LocationLevel::SubBranch | LocationLevel::Unit => vec![location.id.clone()],
        };

        log::debug!("Scope of {id}: {} location(s)", members.len());

        Ok(Self { location, members })
    }

    /// Sums the full-history report count of every member.
    pub async fn count_all_time(&self, store: &dyn ReportStore) -> Result<u64, AnalyticsError> {
        let counts =
            try_join_all(self.members.iter().map(|id| store.report_count(id, None))).await?;
        Ok(counts.into_iter().sum())
    }
}

/// Fetches a location, mapping absence to [`AnalyticsError::NotFound`].
pub(crate) async fn find_location(
    store: &dyn ReportStore,
    id: &LocationId,
) -> Result<Location, AnalyticsError> {
    store
        .get_location(id)
        .await?
        .ok_or_else(|| AnalyticsError::NotFound { id: id.clone() })
}

/// Newest first; equal timestamps by id so merged scopes are deterministic.
pub(crate) fn sort_newest_first(reports: &mut [Report]) {
    reports.sort_by(|a, b| {
        b.report_date
            .cmp(&a.report_date)
            .then_with(|| a.id.cmp(&b.id))
    });
}
