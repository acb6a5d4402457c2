//! In-process report store over a loaded dataset snapshot.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use safety_map_location_models::{Location, LocationId, LocationTree};
use safety_map_report_models::{DateRange, MonthKey, Report, in_range};
use serde::Deserialize;

use crate::{ReportStore, StoreError};

/// On-disk dataset shape: `{ "locations": [...], "reports": [...] }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dataset {
    /// Every location of the hierarchy.
    pub locations: Vec<Location>,
    /// Every report, attributed to one of `locations`.
    #[serde(default)]
    pub reports: Vec<Report>,
}

/// A read-only store holding the whole hierarchy and report set in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tree: LocationTree,
    reports: BTreeMap<LocationId, Vec<Report>>,
}

impl MemoryStore {
    /// Builds a store from a dataset.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the locations do not form a valid
    /// hierarchy or a report refers to an unknown location.
    pub fn new(dataset: Dataset) -> Result<Self, StoreError> {
        let tree = LocationTree::new(dataset.locations)?;

        let mut reports: BTreeMap<LocationId, Vec<Report>> = BTreeMap::new();
        for report in dataset.reports {
            if tree.get(&report.location_id).is_none() {
                return Err(StoreError::UnknownLocation {
                    report_id: report.id.to_string(),
                    location_id: report.location_id,
                });
            }
            reports
                .entry(report.location_id.clone())
                .or_default()
                .push(report);
        }

        log::debug!(
            "Loaded {} locations and {} reports",
            tree.len(),
            reports.values().map(Vec::len).sum::<usize>()
        );

        Ok(Self { tree, reports })
    }

    /// Parses a JSON dataset.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the JSON is malformed or the dataset is
    /// inconsistent.
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        Self::new(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON dataset file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read, the JSON is
    /// malformed or the dataset is inconsistent.
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        log::info!("Loading dataset from {}", path.display());
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&json)
    }

    /// The location hierarchy.
    #[must_use]
    pub const fn tree(&self) -> &LocationTree {
        &self.tree
    }

    fn reports_at<'a>(
        &'a self,
        location_id: &LocationId,
        range: Option<&'a DateRange>,
    ) -> impl Iterator<Item = &'a Report> + use<'a> {
        self.reports
            .get(location_id)
            .into_iter()
            .flatten()
            .filter(move |r| in_range(range, r.report_date.date))
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn get_location(&self, id: &LocationId) -> Result<Option<Location>, StoreError> {
        Ok(self.tree.get(id).cloned())
    }

    async fn main_branches(&self) -> Result<Vec<Location>, StoreError> {
        Ok(self.tree.main_branches().cloned().collect())
    }

    async fn query_children(
        &self,
        main_branch_id: &LocationId,
    ) -> Result<Vec<Location>, StoreError> {
        Ok(self.tree.children(main_branch_id).cloned().collect())
    }

    async fn query_reports(
        &self,
        location_id: &LocationId,
        range: Option<&DateRange>,
    ) -> Result<Vec<Report>, StoreError> {
        Ok(self.reports_at(location_id, range).cloned().collect())
    }

    async fn query_reports_by_month(
        &self,
        location_id: &LocationId,
        month: MonthKey,
        range: Option<&DateRange>,
    ) -> Result<Vec<Report>, StoreError> {
        Ok(self
            .reports_at(location_id, range)
            .filter(|r| month.contains(r.report_date.date))
            .cloned()
            .collect())
    }

    async fn query_reports_by_category(
        &self,
        location_id: &LocationId,
        category: &str,
        range: Option<&DateRange>,
    ) -> Result<Vec<Report>, StoreError> {
        Ok(self
            .reports_at(location_id, range)
            .filter(|r| r.category == category)
            .cloned()
            .collect())
    }

    async fn report_count(
        &self,
        location_id: &LocationId,
        range: Option<&DateRange>,
    ) -> Result<u64, StoreError> {
        Ok(self.reports_at(location_id, range).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const DATASET: &str = r#"{
        "locations": [
            { "id": "KOE", "name": "El Tari", "city": "Kupang", "provinsi": "NTT",
              "level": "cabang_utama", "coordinates": [-10.1716, 123.6711] },
            { "id": "KOE-U1", "name": "Unit Tambolaka", "level": "unit", "parent_id": "KOE" }
        ],
        "reports": [
            { "id": 1, "airport_id": "KOE", "category": "Bird Strike",
              "report_date": "2024-01-03", "status": "Open" },
            { "id": 2, "airport_id": "KOE", "category": "FOD",
              "report_date": "2024-02-10 09:00:00", "status": "Open" },
            { "id": 3, "airport_id": "KOE-U1", "category": "FOD",
              "report_date": "2024-02-11", "status": "Open" }
        ]
    }"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn queries_are_per_node() {
        let store = MemoryStore::from_json_str(DATASET).unwrap();
        let koe = LocationId::from("KOE");

        assert_eq!(store.report_count(&koe, None).await.unwrap(), 2);
        assert_eq!(
            store
                .report_count(&LocationId::from("KOE-U1"), None)
                .await
                .unwrap(),
            1
        );
        assert_eq!(store.report_count(&LocationId::from("X"), None).await.unwrap(), 0);

        let children = store.query_children(&koe).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id.as_str(), "KOE-U1");
    }

    #[tokio::test]
    async fn filters_by_range_month_and_category() {
        let store = MemoryStore::from_json_str(DATASET).unwrap();
        let koe = LocationId::from("KOE");
        let feb = MonthKey::new(2024, 2).unwrap();

        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        assert_eq!(store.report_count(&koe, Some(&range)).await.unwrap(), 1);

        let in_feb = store.query_reports_by_month(&koe, feb, None).await.unwrap();
        assert_eq!(in_feb.len(), 1);
        assert_eq!(in_feb[0].id.as_str(), "2");

        let none = store
            .query_reports_by_month(&koe, feb, Some(&range))
            .await
            .unwrap();
        assert!(none.is_empty());

        let fod = store.query_reports_by_category(&koe, "FOD", None).await.unwrap();
        assert_eq!(fod.len(), 1);
        let lower = store.query_reports_by_category(&koe, "fod", None).await.unwrap();
        assert!(lower.is_empty());
    }

    #[test]
    fn rejects_reports_for_unknown_locations() {
        let json = r#"{
            "locations": [{ "id": "A", "name": "A", "level": "cabang_utama" }],
            "reports": [{ "id": "r", "locationId": "B", "reportDate": "2024-01-01" }]
        }"#;
        assert!(matches!(
            MemoryStore::from_json_str(json),
            Err(StoreError::UnknownLocation { .. })
        ));
    }
}
