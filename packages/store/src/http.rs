//! JSON-over-HTTP adapter for the dashboard backend.
//!
//! Endpoints, relative to the configured base URL:
//!
//! | Query | Request |
//! |---|---|
//! | main branches | `GET /airports?type=cabang` |
//! | one location | `GET /airports/{id}` (404 means unknown) |
//! | children | `GET /airports?parent_id={id}` |
//! | reports | `GET /airports/{id}/reports?start_date&end_date&month&category` |
//! | count | `GET /airports/{id}/reports/count?start_date&end_date` |
//!
//! List responses may be bare arrays or wrapped as `{ "data": [...] }`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use safety_map_location_models::{Location, LocationId};
use safety_map_report_models::{DateRange, MonthKey, Report};
use serde::Deserialize;

use crate::retry::{self, RetryPolicy};
use crate::{ReportStore, StoreError};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

#[derive(Deserialize)]
struct CountBody {
    #[serde(alias = "total", alias = "total_reports")]
    count: u64,
}

/// A [`ReportStore`] backed by the dashboard's REST backend.
#[derive(Debug, Clone)]
pub struct HttpReportStore {
    client: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl HttpReportStore {
    /// Creates a store for the backend at `base_url`
    /// (e.g. `http://localhost:8000/api`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if `base_url` is not an absolute URL or the
    /// HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url).map_err(|e| StoreError::Decode {
            message: format!("Invalid base URL '{base_url}': {e}"),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Decode {
                message: format!("Base URL '{base_url}' cannot have path segments"),
            });
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            retry,
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<T, StoreError> {
        log::debug!("GET {url} {params:?}");
        retry::send_json(&self.retry, || self.client.get(url.clone()).query(params)).await
    }

    async fn get_list<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let body: Envelope<Vec<T>> = self.get_json(url, params).await?;
        Ok(body.into_inner())
    }

    async fn get_reports(
        &self,
        location_id: &LocationId,
        range: Option<&DateRange>,
        extra: Option<(&'static str, String)>,
    ) -> Result<Vec<Report>, StoreError> {
        let url = self.url(&["airports", location_id.as_str(), "reports"]);
        let mut params = range_params(range);
        params.extend(extra);
        self.get_list(url, &params).await
    }
}

fn range_params(range: Option<&DateRange>) -> Vec<(&'static str, String)> {
    range.map_or_else(Vec::new, |r| {
        vec![
            ("start_date", r.start().to_string()),
            ("end_date", r.end().to_string()),
        ]
    })
}

#[async_trait]
impl ReportStore for HttpReportStore {
    async fn get_location(&self, id: &LocationId) -> Result<Option<Location>, StoreError> {
        let url = self.url(&["airports", id.as_str()]);
        match self.get_json::<Envelope<Location>>(url, &[]).await {
            Ok(body) => Ok(Some(body.into_inner())),
            Err(e) if e.status() == Some(404) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn main_branches(&self) -> Result<Vec<Location>, StoreError> {
        let url = self.url(&["airports"]);
        self.get_list(url, &[("type", "cabang".to_string())]).await
    }

    async fn query_children(
        &self,
        main_branch_id: &LocationId,
    ) -> Result<Vec<Location>, StoreError> {
        let url = self.url(&["airports"]);
        self.get_list(url, &[("parent_id", main_branch_id.to_string())])
            .await
    }

    async fn query_reports(
        &self,
        location_id: &LocationId,
        range: Option<&DateRange>,
    ) -> Result<Vec<Report>, StoreError> {
        self.get_reports(location_id, range, None).await
    }

    async fn query_reports_by_month(
        &self,
        location_id: &LocationId,
        month: MonthKey,
        range: Option<&DateRange>,
    ) -> Result<Vec<Report>, StoreError> {
        self.get_reports(location_id, range, Some(("month", month.to_string())))
            .await
    }

    async fn query_reports_by_category(
        &self,
        location_id: &LocationId,
        category: &str,
        range: Option<&DateRange>,
    ) -> Result<Vec<Report>, StoreError> {
        self.get_reports(location_id, range, Some(("category", category.to_string())))
            .await
    }

    async fn report_count(
        &self,
        location_id: &LocationId,
        range: Option<&DateRange>,
    ) -> Result<u64, StoreError> {
        let url = self.url(&["airports", location_id.as_str(), "reports", "count"]);
        let body: Envelope<CountBody> = self.get_json(url, &range_params(range)).await?;
        Ok(body.into_inner().count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> HttpReportStore {
        HttpReportStore::new(
            &format!("{}/api", server.uri()),
            DEFAULT_TIMEOUT,
            RetryPolicy::none(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn unknown_location_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/airports/NOPE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let location = store(&server)
            .get_location(&LocationId::from("NOPE"))
            .await
            .unwrap();
        assert!(location.is_none());
    }

    #[tokio::test]
    async fn children_accept_wrapped_lists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/airports"))
            .and(query_param("parent_id", "KOE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    { "id": "KOE-U1", "name": "Unit Tambolaka", "level": "unit", "parent_id": "KOE" }
                ]
            })))
            .mount(&server)
            .await;

        let children = store(&server)
            .query_children(&LocationId::from("KOE"))
            .await
            .unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].parent_id, Some(LocationId::from("KOE")));
    }

    #[tokio::test]
    async fn reports_forward_range_and_month() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/airports/KOE/reports"))
            .and(query_param("start_date", "2024-02-01"))
            .and(query_param("end_date", "2024-02-15"))
            .and(query_param("month", "2024-02"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": 7, "airport_id": "KOE", "category": "FOD",
                  "report_date": "2024-02-03 10:00:00", "status": "Open" }
            ])))
            .mount(&server)
            .await;

        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
        )
        .unwrap();
        let reports = store(&server)
            .query_reports_by_month(
                &LocationId::from("KOE"),
                MonthKey::new(2024, 2).unwrap(),
                Some(&range),
            )
            .await
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].id.as_str(), "7");
    }

    #[tokio::test]
    async fn null_columns_decode_as_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/airports/KOE/reports"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    { "id": 1, "airport_id": "KOE", "category": null,
                      "report_date": "2024-01-05", "status": null, "evidence": null },
                    { "id": 2, "airport_id": "KOE", "category": "FOD",
                      "report_date": "2024-01-06", "status": "Open" }
                ]
            })))
            .mount(&server)
            .await;

        let reports = store(&server)
            .query_reports(&LocationId::from("KOE"), None)
            .await
            .unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].category_name(), None);
        assert_eq!(reports[1].category_name(), Some("FOD"));
    }

    #[tokio::test]
    async fn count_and_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/airports/KOE/reports/count"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total": 12
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/airports"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = store(&server);
        assert_eq!(
            store
                .report_count(&LocationId::from("KOE"), None)
                .await
                .unwrap(),
            12
        );

        let err = store.main_branches().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }
}
