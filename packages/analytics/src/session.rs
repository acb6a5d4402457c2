//! Last-request-wins sequencing for interactive clients.
//!
//! A client that re-requests statistics whenever its selection changes can
//! have several requests in flight. Each request takes a
//! [`RequestTicket`]; when it completes, its result is only delivered if
//! no newer ticket was issued in the meantime.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use safety_map_analytics_models::{AggregatedStats, HierarchyRollup};
use safety_map_location_models::LocationId;
use safety_map_report_models::{DateRange, MonthLocale};
use safety_map_store::ReportStore;

use crate::{AnalyticsError, compute_hierarchy, compute_stats_localized};

/// Sequence number of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    /// The raw sequence number.
    #[must_use]
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

/// Issues monotonically increasing tickets.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    /// Creates a sequencer that has issued no tickets.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
        }
    }

    /// Issues a ticket newer than every ticket issued before.
    pub fn issue(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` is still the newest one issued.
    #[must_use]
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Wraps `value` according to whether `ticket` is still current.
    #[must_use]
    pub fn settle<T>(&self, ticket: RequestTicket, value: T) -> Sequenced<T> {
        if self.is_current(ticket) {
            Sequenced::Current(value)
        } else {
            log::debug!("Request {} superseded", ticket.0);
            Sequenced::Superseded
        }
    }
}

/// Outcome of a sequenced request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sequenced<T> {
    /// The newest request's result.
    Current(T),
    /// A newer request was issued before this one completed.
    Superseded,
}

impl<T> Sequenced<T> {
    /// The result, if still current.
    pub fn into_current(self) -> Option<T> {
        match self {
            Self::Current(value) => Some(value),
            Self::Superseded => None,
        }
    }
}

/// One client's view of the engine.
///
/// Statistics and hierarchy requests are sequenced independently, so a
/// slow rollup never discards fresh statistics or the other way round.
/// Errors of superseded requests are dropped with their results.
pub struct StatsSession {
    store: Arc<dyn ReportStore>,
    locale: MonthLocale,
    stats: RequestSequencer,
    hierarchy: RequestSequencer,
}

impl std::fmt::Debug for StatsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsSession")
            .field("locale", &self.locale)
            .field("stats", &self.stats)
            .field("hierarchy", &self.hierarchy)
            .finish_non_exhaustive()
    }
}

impl StatsSession {
    /// Creates a session with English month labels.
    #[must_use]
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self::with_locale(store, MonthLocale::default())
    }

    /// Creates a session labelling months in `locale`.
    #[must_use]
    pub fn with_locale(store: Arc<dyn ReportStore>, locale: MonthLocale) -> Self {
        Self {
            store,
            locale,
            stats: RequestSequencer::new(),
            hierarchy: RequestSequencer::new(),
        }
    }

    /// Computes statistics for a newly selected location or range.
    ///
    /// # Errors
    ///
    /// Returns the [`AnalyticsError`] of the computation if this request is
    /// still the newest one.
    pub async fn select_location(
        &self,
        location_id: &LocationId,
        range: Option<&DateRange>,
    ) -> Result<Sequenced<AggregatedStats>, AnalyticsError> {
        let ticket = self.stats.issue();
        let result =
            compute_stats_localized(self.store.as_ref(), location_id, range, self.locale).await;
        match self.stats.settle(ticket, result) {
            Sequenced::Current(result) => result.map(Sequenced::Current),
            Sequenced::Superseded => Ok(Sequenced::Superseded),
        }
    }

    /// Computes the rollup for a newly selected main branch.
    ///
    /// # Errors
    ///
    /// Returns the [`AnalyticsError`] of the computation if this request is
    /// still the newest one.
    pub async fn load_hierarchy(
        &self,
        main_branch_id: &LocationId,
    ) -> Result<Sequenced<HierarchyRollup>, AnalyticsError> {
        let ticket = self.hierarchy.issue();
        let result = compute_hierarchy(self.store.as_ref(), main_branch_id).await;
        match self.hierarchy.settle(ticket, result) {
            Sequenced::Current(result) => result.map(Sequenced::Current),
            Sequenced::Superseded => Ok(Sequenced::Superseded),
        }
    }
}
