//! Drill-down from a chart bar or category to the underlying reports.
//!
//! Results cover the same scope as [`compute_stats`](crate::compute_stats)
//! and are ordered newest first, ties broken by report id.

use futures::future::try_join_all;
use safety_map_location_models::LocationId;
use safety_map_report_models::{DateRange, MonthKey, Report};
use safety_map_store::ReportStore;

use crate::{AnalyticsError, Scope, sort_newest_first};

/// Reports of a location's scope in `month`.
///
/// An active `range` narrows the month: only reports inside both are
/// returned.
///
/// # Errors
///
/// * [`AnalyticsError::NotFound`] if the location does not exist
/// * [`AnalyticsError::StoreUnavailable`] if a store query fails
pub async fn resolve_by_month(
    store: &dyn ReportStore,
    location_id: &LocationId,
    month: MonthKey,
    range: Option<&DateRange>,
) -> Result<Vec<Report>, AnalyticsError> {
    let scope = Scope::resolve(store, location_id).await?;
    let batches = try_join_all(
        scope
            .members
            .iter()
            .map(|id| store.query_reports_by_month(id, month, range)),
    )
    .await?;

    let mut reports: Vec<Report> = batches.into_iter().flatten().collect();
    sort_newest_first(&mut reports);
    log::debug!("{} report(s) for {location_id} in {month}", reports.len());
    Ok(reports)
}

/// Like [`resolve_by_month`], taking a chart label such as `"Jan 2024"` or
/// `"Okt 2023"`.
///
/// # Errors
///
/// * [`AnalyticsError::InvalidMonthLabel`] if the label's month name is
///   unknown or the label is malformed
/// * otherwise as [`resolve_by_month`]
pub async fn resolve_by_month_label(
    store: &dyn ReportStore,
    location_id: &LocationId,
    label: &str,
    range: Option<&DateRange>,
) -> Result<Vec<Report>, AnalyticsError> {
    let month = MonthKey::from_label(label)?;
    resolve_by_month(store, location_id, month, range).await
}

/// Reports of a location's scope whose category is exactly `category`.
///
/// # Errors
///
/// * [`AnalyticsError::NotFound`] if the location does not exist
/// * [`AnalyticsError::StoreUnavailable`] if a store query fails
pub async fn resolve_by_category(
    store: &dyn ReportStore,
    location_id: &LocationId,
    category: &str,
    range: Option<&DateRange>,
) -> Result<Vec<Report>, AnalyticsError> {
    let scope = Scope::resolve(store, location_id).await?;
    let batches = try_join_all(
        scope
            .members
            .iter()
            .map(|id| store.query_reports_by_category(id, category, range)),
    )
    .await?;

    let mut reports: Vec<Report> = batches.into_iter().flatten().collect();
    sort_newest_first(&mut reports);
    log::debug!(
        "{} '{category}' report(s) for {location_id}",
        reports.len()
    );
    Ok(reports)
}
