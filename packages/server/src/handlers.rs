//! HTTP handler functions for the safety map API.

use actix_web::{HttpResponse, web};
use safety_map_analytics::{
    AnalyticsError, compute_hierarchy, compute_stats_localized, map_rollups,
    resolve_by_category, resolve_by_month, window_trend,
};
use safety_map_location_models::LocationId;
use safety_map_report_models::{DateRange, MonthKey, parse_date};
use safety_map_server_models::{
    ApiError, ApiHealth, ApiLocationSummary, ApiReport, ApiStats, ReportQueryParams,
    StatsQueryParams,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/locations`
///
/// Lists the main branches that can be placed on the map, with their
/// aggregated all-time totals.
pub async fn locations(state: web::Data<AppState>) -> HttpResponse {
    match map_rollups(state.store.as_ref()).await {
        Ok(rollups) => {
            let summaries: Vec<ApiLocationSummary> = rollups
                .into_iter()
                .map(|rollup| {
                    ApiLocationSummary::new(
                        rollup.parent,
                        rollup.grand_total,
                        rollup.total_children > 0,
                    )
                })
                .collect();
            HttpResponse::Ok().json(summaries)
        }
        Err(e) => error_response(&e),
    }
}

/// `GET /api/locations/{id}/stats`
///
/// Statistics for a location, with the trend windowed for display.
pub async fn stats(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<StatsQueryParams>,
) -> HttpResponse {
    let range = match parse_range(params.start_date.as_deref(), params.end_date.as_deref()) {
        Ok(range) => range,
        Err(response) => return response,
    };
    let id = LocationId::new(path.into_inner());
    let window = params.window.unwrap_or_default();

    match compute_stats_localized(state.store.as_ref(), &id, range.as_ref(), state.locale).await
    {
        Ok(stats) => {
            let display_trend = window_trend(&stats.monthly_trend, window, stats.range_active());
            HttpResponse::Ok().json(ApiStats {
                ranked_categories: stats.ranked_categories(),
                window,
                display_trend,
                stats,
            })
        }
        Err(e) => error_response(&e),
    }
}

/// `GET /api/locations/{id}/hierarchy`
pub async fn hierarchy(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = LocationId::new(path.into_inner());
    match compute_hierarchy(state.store.as_ref(), &id).await {
        Ok(rollup) => HttpResponse::Ok().json(rollup),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/locations/{id}/reports`
///
/// Reports behind a trend bar (`month`) or a category (`category`).
pub async fn reports(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<ReportQueryParams>,
) -> HttpResponse {
    let range = match parse_range(params.start_date.as_deref(), params.end_date.as_deref()) {
        Ok(range) => range,
        Err(response) => return response,
    };
    let id = LocationId::new(path.into_inner());
    let store = state.store.as_ref();

    let result = match (params.month.as_deref(), params.category.as_deref()) {
        (Some(month), None) => match MonthKey::parse(month) {
            Ok(month) => resolve_by_month(store, &id, month, range.as_ref()).await,
            Err(e) => Err(e.into()),
        },
        (None, Some(category)) => resolve_by_category(store, &id, category, range.as_ref()).await,
        _ => {
            return bad_request(
                "invalid_query",
                "Exactly one of 'month' and 'category' is required".to_string(),
            );
        }
    };

    match result {
        Ok(reports) => {
            let reports: Vec<ApiReport> = reports.into_iter().map(ApiReport::from).collect();
            HttpResponse::Ok().json(reports)
        }
        Err(e) => error_response(&e),
    }
}

/// Parses `startDate`/`endDate`. A lone bound means no filter.
fn parse_range(start: Option<&str>, end: Option<&str>) -> Result<Option<DateRange>, HttpResponse> {
    let parse = |value: Option<&str>| {
        value
            .filter(|v| !v.trim().is_empty())
            .map(parse_date)
            .transpose()
            .map_err(|e| bad_request("invalid_date", e.to_string()))
    };
    let start = parse(start)?;
    let end = parse(end)?;
    DateRange::from_bounds(start, end).map_err(|e| error_response(&AnalyticsError::from(e)))
}

fn bad_request(kind: &str, error: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError {
        error,
        kind: kind.to_string(),
    })
}

/// Maps an engine error to its HTTP status and JSON body.
fn error_response(e: &AnalyticsError) -> HttpResponse {
    let (mut response, kind) = match e {
        AnalyticsError::NotFound { .. } => (HttpResponse::NotFound(), "not_found"),
        AnalyticsError::InvalidOperation { .. } => (HttpResponse::Conflict(), "invalid_operation"),
        AnalyticsError::InvalidDateRange(_) => (HttpResponse::BadRequest(), "invalid_date_range"),
        AnalyticsError::InvalidMonthLabel(_) => {
            (HttpResponse::BadRequest(), "invalid_month_label")
        }
        AnalyticsError::StoreUnavailable(_) => {
            log::error!("Report store failed: {e}");
            (HttpResponse::BadGateway(), "store_unavailable")
        }
    };
    response.json(ApiError {
        error: e.to_string(),
        kind: kind.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use safety_map_report_models::MonthLocale;
    use safety_map_store::memory::MemoryStore;
    use serde_json::Value;

    use super::*;

    const DATASET: &str = r#"{
        "locations": [
            { "id": "UPG", "name": "Sultan Hasanuddin", "city": "Makassar",
              "provinsi": "Sulawesi Selatan", "level": "cabang_utama",
              "coordinates": [-5.0617, 119.554] },
            { "id": "UPG-U1", "name": "Unit Toraja", "level": "unit", "parent_id": "UPG" },
            { "id": "BTJ", "name": "Sultan Iskandar Muda", "level": "cabang_utama" }
        ],
        "reports": [
            { "id": "a", "airport_id": "UPG", "category": "FOD", "report_date": "2024-01-10", "status": "Open" },
            { "id": "b", "airport_id": "UPG", "category": "FOD", "report_date": "2024-05-03", "status": "Analysis Completed" },
            { "id": "c", "airport_id": "UPG-U1", "category": "Bird Strike", "report_date": "2024-05-20", "status": "Send to Analyst" },
            { "id": "d", "airport_id": "BTJ", "category": "FOD", "report_date": "2024-02-01", "status": "Open" }
        ]
    }"#;

    fn state(locale: MonthLocale) -> web::Data<AppState> {
        web::Data::new(AppState {
            store: Arc::new(MemoryStore::from_json_str(DATASET).unwrap()),
            locale,
        })
    }

    async fn get(uri: &str) -> (StatusCode, Value) {
        get_localized(uri, MonthLocale::English).await
    }

    async fn get_localized(uri: &str, locale: MonthLocale) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(state(locale))
                .configure(crate::configure),
        )
        .await;
        let response = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        let status = response.status();
        let body: Value = test::read_body_json(response).await;
        (status, body)
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let (status, body) = get("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], true);
    }

    #[actix_web::test]
    async fn lists_only_mappable_branches() {
        let (status, body) = get("/api/locations").await;
        assert_eq!(status, StatusCode::OK);

        let locations = body.as_array().unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0]["id"], "UPG");
        assert_eq!(locations[0]["totalReports"], 3);
        assert_eq!(locations[0]["hasChildren"], true);
        assert_eq!(locations[0]["badge"], "CABANG UTAMA");
    }

    #[actix_web::test]
    async fn stats_with_window_and_range() {
        let (status, body) = get("/api/locations/UPG/stats?window=6m").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalAllTime"], 3);
        assert_eq!(body["totalInRange"], 3);
        assert_eq!(body["window"], "6m");
        assert_eq!(body["rankedCategories"][0]["category"], "FOD");
        assert_eq!(body["displayTrend"].as_array().unwrap().len(), 2);

        let (_, body) =
            get("/api/locations/UPG/stats?startDate=2024-05-01&endDate=2024-05-31").await;
        assert_eq!(body["totalAllTime"], 3);
        assert_eq!(body["totalInRange"], 2);
        assert_eq!(body["range"]["startDate"], "2024-05-01");
        assert_eq!(body["displayTrend"][0]["label"], "May 2024");
    }

    #[actix_web::test]
    async fn lone_bound_is_ignored() {
        let (status, body) = get("/api/locations/UPG/stats?startDate=2024-05-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalInRange"], 3);
        assert!(body["range"].is_null());
    }

    #[actix_web::test]
    async fn localized_trend_labels() {
        let (_, body) = get_localized("/api/locations/UPG/stats", MonthLocale::Indonesian).await;
        assert_eq!(body["monthlyTrend"][1]["label"], "Mei 2024");
        assert_eq!(body["monthlyTrend"][1]["month"], "2024-05");
    }

    #[actix_web::test]
    async fn hierarchy_rollup() {
        let (status, body) = get("/api/locations/UPG/hierarchy").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["grandTotal"], 3);
        assert_eq!(body["locationCount"], 2);
        assert_eq!(body["units"][0]["location"]["id"], "UPG-U1");
        assert_eq!(body["units"][0]["reportCount"], 1);

        let (status, body) = get("/api/locations/UPG-U1/hierarchy").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "invalid_operation");
    }

    #[actix_web::test]
    async fn reports_by_month_label_and_category() {
        let (status, body) = get("/api/locations/UPG/reports?month=May%202024").await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["c", "b"]);
        assert_eq!(body[0]["statusColor"], "blue");

        let (_, body) = get("/api/locations/UPG/reports?month=2024-01").await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (_, body) = get(
            "/api/locations/UPG/reports?category=FOD&startDate=2024-05-01&endDate=2024-05-31",
        )
        .await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], "b");
    }

    #[actix_web::test]
    async fn error_mapping() {
        let (status, body) = get("/api/locations/NOPE/stats").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");

        let (status, body) = get("/api/locations/UPG/reports?month=Foo%202024").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_month_label");

        let (status, body) =
            get("/api/locations/UPG/stats?startDate=2024-05-31&endDate=2024-05-01").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_date_range");

        let (status, body) = get("/api/locations/UPG/stats?startDate=yesterday&endDate=2024-05-01").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_date");

        let (status, body) = get("/api/locations/UPG/reports").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_query");
    }
}
