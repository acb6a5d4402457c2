//! Per-location statistics.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use safety_map_analytics_models::{AggregatedStats, TrendPoint};
use safety_map_location_models::LocationId;
use safety_map_report_models::{DateRange, MonthKey, MonthLocale, Report};
use safety_map_store::ReportStore;

use crate::{AnalyticsError, Scope};

/// Computes statistics for a location with English month labels.
///
/// See [`compute_stats_localized`].
///
/// # Errors
///
/// * [`AnalyticsError::NotFound`] if the location does not exist
/// * [`AnalyticsError::StoreUnavailable`] if a store query fails
pub async fn compute_stats(
    store: &dyn ReportStore,
    location_id: &LocationId,
    range: Option<&DateRange>,
) -> Result<AggregatedStats, AnalyticsError> {
    compute_stats_localized(store, location_id, range, MonthLocale::default()).await
}

/// Computes statistics for a location.
///
/// `total_all_time` always covers the full history of the location's
/// scope. Without a range it is taken from the same read as the report
/// list, so the two always agree. Every other figure covers the reports inside `range`, or the
/// full history when `range` is `None`. Reports with an empty category
/// count towards the totals but not towards `top_categories`.
///
/// # Errors
///
/// * [`AnalyticsError::NotFound`] if the location does not exist
/// * [`AnalyticsError::StoreUnavailable`] if a store query fails
pub async fn compute_stats_localized(
    store: &dyn ReportStore,
    location_id: &LocationId,
    range: Option<&DateRange>,
    locale: MonthLocale,
) -> Result<AggregatedStats, AnalyticsError> {
    let scope = Scope::resolve(store, location_id).await?;

    let (total_all_time, reports) = if range.is_some() {
        futures::try_join!(
            scope.count_all_time(store),
            fetch_reports(store, &scope, range),
        )?
    } else {
        let reports = fetch_reports(store, &scope, None).await?;
        (reports.len() as u64, reports)
    };

    log::debug!(
        "Stats for {location_id}: {} of {total_all_time} report(s) in range {}",
        reports.len(),
        range.map_or_else(|| "all time".to_string(), ToString::to_string),
    );

    let mut stats = AggregatedStats::empty(scope.location.id, range.copied());
    stats.total_all_time = total_all_time;
    stats.total_in_range = reports.len() as u64;

    let mut months: BTreeMap<MonthKey, u64> = BTreeMap::new();
    for report in &reports {
        match report.category_name() {
            Some(category) => {
                *stats
                    .top_categories
                    .entry(category.to_string())
                    .or_default() += 1;
            }
            None => stats.uncategorized_in_range += 1,
        }
        *months.entry(MonthKey::of(report.report_date.date)).or_default() += 1;
    }

    stats.monthly_trend = months
        .into_iter()
        .map(|(month, count)| TrendPoint {
            label: month.label(locale),
            month,
            count,
        })
        .collect();

    Ok(stats)
}

async fn fetch_reports(
    store: &dyn ReportStore,
    scope: &Scope,
    range: Option<&DateRange>,
) -> Result<Vec<Report>, AnalyticsError> {
    let batches =
        try_join_all(scope.members.iter().map(|id| store.query_reports(id, range))).await?;
    Ok(batches.into_iter().flatten().collect())
}
