//! Quick-filter slicing of the monthly trend.

use safety_map_analytics_models::{TrendPoint, WindowMode};

/// Derives the bars to display from a chronologically sorted trend.
///
/// An explicit date range overrides the window: when `range_active` is
/// set the trend is returned unchanged. Otherwise the trailing
/// [`WindowMode::limit`] entries are kept. Missing months are not padded.
#[must_use]
pub fn window_trend(trend: &[TrendPoint], mode: WindowMode, range_active: bool) -> Vec<TrendPoint> {
    if range_active {
        return trend.to_vec();
    }
    let skip = mode
        .limit()
        .map_or(0, |limit| trend.len().saturating_sub(limit));
    trend[skip..].to_vec()
}
