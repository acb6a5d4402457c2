#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types produced by the aggregation engine.
//!
//! These are plain data: the engine in `safety_map_analytics` fills them
//! and the server serializes them as-is.

use std::collections::BTreeMap;

use safety_map_location_models::{Location, LocationId};
use safety_map_report_models::{DateRange, MonthKey};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Quick-filter window applied to the monthly trend when no explicit date
/// range is active.
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
pub enum WindowMode {
    /// The six most recent months with data.
    #[serde(rename = "6m")]
    #[strum(serialize = "6m")]
    Last6,
    /// The twelve most recent months with data.
    #[serde(rename = "12m")]
    #[strum(serialize = "12m")]
    Last12,
    /// The full trend.
    #[default]
    #[serde(rename = "all")]
    #[strum(serialize = "all")]
    All,
}

impl WindowMode {
    /// Maximum number of trailing trend entries kept, `None` for all.
    #[must_use]
    pub const fn limit(self) -> Option<usize> {
        match self {
            Self::Last6 => Some(6),
            Self::Last12 => Some(12),
            Self::All => None,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Last6, Self::Last12, Self::All]
    }
}

/// One bar of the monthly trend chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// Display label, e.g. `"Jan 2024"`.
    pub label: String,
    /// Canonical month key, e.g. `"2024-01"`.
    pub month: MonthKey,
    /// Reports in this month.
    pub count: u64,
}

/// Count of reports in a single category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// Category name, exactly as reported.
    pub category: String,
    /// Number of reports.
    pub count: u64,
}

/// Statistics for one location over an optional date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedStats {
    /// Location the statistics were computed for.
    pub location_id: LocationId,
    /// Reports over the location's whole history, ignoring `range`.
    pub total_all_time: u64,
    /// Reports inside `range`, or the full history when there is none.
    pub total_in_range: u64,
    /// The range that was applied.
    pub range: Option<DateRange>,
    /// Reports per non-empty category inside the range.
    pub top_categories: BTreeMap<String, u64>,
    /// Reports inside the range with an empty category.
    pub uncategorized_in_range: u64,
    /// Reports per month inside the range, ascending, months with at
    /// least one report only.
    pub monthly_trend: Vec<TrendPoint>,
}

impl AggregatedStats {
    /// Zeroed statistics for a location without reports.
    #[must_use]
    pub const fn empty(location_id: LocationId, range: Option<DateRange>) -> Self {
        Self {
            location_id,
            total_all_time: 0,
            total_in_range: 0,
            range,
            top_categories: BTreeMap::new(),
            uncategorized_in_range: 0,
            monthly_trend: Vec::new(),
        }
    }

    /// Categories by count descending; ties are ordered by name.
    #[must_use]
    pub fn ranked_categories(&self) -> Vec<CategoryCount> {
        let mut ranked: Vec<CategoryCount> = self
            .top_categories
            .iter()
            .map(|(category, &count)| CategoryCount {
                category: category.clone(),
                count,
            })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
        ranked
    }

    /// The most frequent category, if any report has one.
    #[must_use]
    pub fn top_category(&self) -> Option<CategoryCount> {
        self.ranked_categories().into_iter().next()
    }

    /// Number of distinct categories in range.
    #[must_use]
    pub fn category_count(&self) -> usize {
        self.top_categories.len()
    }

    /// Count of the most frequent category, `0` when there is none.
    #[must_use]
    pub fn top_incident_count(&self) -> u64 {
        self.top_categories.values().copied().max().unwrap_or(0)
    }

    /// Whether an explicit date range was applied.
    #[must_use]
    pub const fn range_active(&self) -> bool {
        self.range.is_some()
    }
}

/// A child location of a main branch with its full-history report count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildReportCount {
    /// The child location.
    pub location: Location,
    /// Reports attributed to the child itself.
    pub report_count: u64,
}

/// Report counts of a main branch and each of its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyRollup {
    /// The main branch.
    pub parent: Location,
    /// Reports attributed to the main branch itself.
    pub parent_report_count: u64,
    /// Parent plus all children.
    pub grand_total: u64,
    /// Sub-branches in store order.
    pub sub_branches: Vec<ChildReportCount>,
    /// Units in store order.
    pub units: Vec<ChildReportCount>,
    /// `sub_branches.len() + units.len()`.
    pub total_children: usize,
    /// Locations covered by `grand_total`, i.e. children plus the parent.
    pub location_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(categories: &[(&str, u64)]) -> AggregatedStats {
        let mut stats = AggregatedStats::empty(LocationId::from("CGK"), None);
        stats.top_categories = categories
            .iter()
            .map(|(name, count)| ((*name).to_string(), *count))
            .collect();
        stats
    }

    #[test]
    fn window_mode_wire_names() {
        assert_eq!("6m".parse::<WindowMode>().unwrap(), WindowMode::Last6);
        assert_eq!(WindowMode::Last12.to_string(), "12m");
        assert_eq!(
            serde_json::to_value(WindowMode::All).unwrap(),
            serde_json::json!("all")
        );
        assert!("3m".parse::<WindowMode>().is_err());
        assert_eq!(WindowMode::default(), WindowMode::All);
    }

    #[test]
    fn ranking_breaks_ties_by_name() {
        let stats = stats(&[("FOD", 3), ("Bird Strike", 3), ("Runway Incursion", 5)]);
        let ranked: Vec<_> = stats
            .ranked_categories()
            .into_iter()
            .map(|c| c.category)
            .collect();
        assert_eq!(ranked, ["Runway Incursion", "Bird Strike", "FOD"]);
        assert_eq!(stats.top_incident_count(), 5);
        assert_eq!(stats.category_count(), 3);
    }

    #[test]
    fn empty_stats_have_no_top_category() {
        let stats = stats(&[]);
        assert_eq!(stats.top_category(), None);
        assert_eq!(stats.top_incident_count(), 0);
        assert!(!stats.range_active());
    }

    #[test]
    fn serializes_camel_case() {
        let value = serde_json::to_value(stats(&[("FOD", 1)])).unwrap();
        assert_eq!(value["locationId"], "CGK");
        assert_eq!(value["totalAllTime"], 0);
        assert_eq!(value["topCategories"]["FOD"], 1);
        assert!(value["range"].is_null());
    }
}
