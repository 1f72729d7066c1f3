//! JSON API for the visibility dashboard.
//!
//! Endpoints (all tenant-scoped):
//! - `GET /api/v1/domains`                        : tracked domains for the caller
//! - `GET /api/v1/domains/{domain_id}/regions`    : canonical region report
//! - `GET /api/v1/domains/{domain_id}/summary`    : search summary over `?start`/`?end`
//!
//! Authentication lives in front of this service: the fronting auth layer
//! validates the session and injects the caller's id as the
//! `x-rankscope-user` header. Requests without it are rejected; a domain the
//! caller does not own is indistinguishable from a missing one.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use rankscope_core::domain::site::{DomainId, TrackedDomain, UserId};
use rankscope_core::errors::ApplicationError;
use rankscope_core::visibility::{build_region_report, summarize, RegionReport, ReportOptions, SearchSummary};
use rankscope_db::repositories::{
    DomainRepository, MetricsRepository, RepositoryError, SearchSeriesRepository,
    SqlDomainRepository, SqlMetricsRepository, SqlSearchSeriesRepository,
};
use rankscope_db::DbPool;

pub const USER_HEADER: &str = "x-rankscope-user";

#[derive(Clone)]
pub struct ApiState {
    pub domains: Arc<dyn DomainRepository>,
    pub metrics: Arc<dyn MetricsRepository>,
    pub search: Arc<dyn SearchSeriesRepository>,
    pub report_options: ReportOptions,
}

impl ApiState {
    /// Wire the state against the SQL repositories.
    pub fn with_pool(db_pool: DbPool, report_options: ReportOptions) -> Self {
        Self {
            domains: Arc::new(SqlDomainRepository::new(db_pool.clone())),
            metrics: Arc::new(SqlMetricsRepository::new(db_pool.clone())),
            search: Arc::new(SqlSearchSeriesRepository::new(db_pool)),
            report_options,
        }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/domains", get(list_domains))
        .route("/api/v1/domains/{domain_id}/regions", get(region_report))
        .route("/api/v1/domains/{domain_id}/summary", get(search_summary))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Caller identity, resolved by the fronting auth layer.
pub struct AuthedUser(pub UserId);

impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match value {
            Some(user) => Ok(AuthedUser(UserId(user.to_string()))),
            None => Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiError { error: "missing caller identity".to_string() }),
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_domains(
    State(state): State<ApiState>,
    AuthedUser(user_id): AuthedUser,
) -> ApiResult<Vec<TrackedDomain>> {
    let correlation_id = Uuid::new_v4().to_string();
    let domains = state
        .domains
        .list_for_user(&user_id)
        .await
        .map_err(|err| repository_failure(err, &correlation_id))?;
    Ok(Json(domains))
}

async fn region_report(
    State(state): State<ApiState>,
    AuthedUser(user_id): AuthedUser,
    Path(domain_id): Path<String>,
) -> ApiResult<RegionReport> {
    let correlation_id = Uuid::new_v4().to_string();
    let domain_id = DomainId(domain_id);
    require_ownership(&state, &user_id, &domain_id, &correlation_id).await?;

    let records = state
        .metrics
        .list_for_domain(&user_id, &domain_id)
        .await
        .map_err(|err| repository_failure(err, &correlation_id))?;
    let report = build_region_report(&records, &state.report_options);

    info!(
        event_name = "api.regions.report_built",
        correlation_id = %correlation_id,
        domain_id = %domain_id.0,
        raw_records = records.len(),
        canonical_regions = report.summary.total_regions,
        "region report built"
    );

    Ok(Json(report))
}

async fn search_summary(
    State(state): State<ApiState>,
    AuthedUser(user_id): AuthedUser,
    Path(domain_id): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<SearchSummary> {
    let correlation_id = Uuid::new_v4().to_string();
    let domain_id = DomainId(domain_id);
    let start = parse_day(query.start.as_deref(), "start")?;
    let end = parse_day(query.end.as_deref(), "end")?;
    require_ownership(&state, &user_id, &domain_id, &correlation_id).await?;

    let series = state
        .search
        .list_range(&user_id, &domain_id, start, end)
        .await
        .map_err(|err| repository_failure(err, &correlation_id))?;

    Ok(Json(summarize(&series)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn require_ownership(
    state: &ApiState,
    user_id: &UserId,
    domain_id: &DomainId,
    correlation_id: &str,
) -> Result<TrackedDomain, (StatusCode, Json<ApiError>)> {
    let found = state
        .domains
        .find_for_user(user_id, domain_id)
        .await
        .map_err(|err| repository_failure(err, correlation_id))?;

    found.ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ApiError { error: format!("domain {} not found", domain_id.0) }),
        )
    })
}

fn parse_day(
    raw: Option<&str>,
    field: &str,
) -> Result<Option<NaiveDate>, (StatusCode, Json<ApiError>)> {
    match raw {
        None => Ok(None),
        Some(value) => value.parse::<NaiveDate>().map(Some).map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiError { error: format!("{field} must be a YYYY-MM-DD date") }),
            )
        }),
    }
}

fn repository_failure(
    failure: RepositoryError,
    correlation_id: &str,
) -> (StatusCode, Json<ApiError>) {
    error!(
        event_name = "api.repository.failure",
        correlation_id = %correlation_id,
        error = %failure,
        "repository query failed"
    );

    let interface =
        ApplicationError::Persistence(failure.to_string()).into_interface(correlation_id);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiError { error: interface.user_message().to_string() }),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{NaiveDate, TimeZone, Utc};
    use tower::util::ServiceExt;

    use rankscope_core::domain::metrics::{PeriodRecord, RawMetricRecord};
    use rankscope_core::domain::site::{DomainId, TrackedDomain, UserId};
    use rankscope_core::visibility::ReportOptions;
    use rankscope_db::repositories::{
        InMemoryDomainRepository, InMemoryMetricsRepository, InMemorySearchSeriesRepository,
    };

    use super::{router, ApiState, USER_HEADER};

    fn raw_record(region: &str, impressions: u64, clicks: u64, score: f64) -> RawMetricRecord {
        RawMetricRecord {
            raw_region_code: region.to_string(),
            domain_id: DomainId("dom-1".to_string()),
            user_id: UserId("user-1".to_string()),
            impressions,
            clicks,
            organic_score: score,
            ai_visibility_score: 10.0,
            demand_score: 60.0,
            overall_visibility_score: score,
            opportunity_score: score,
            avg_position: 5.0,
            ai_mention_count: 1,
            ai_platforms_present: BTreeSet::new(),
            ai_mentioned_competitors: BTreeSet::new(),
            ai_domain_found: false,
            ai_best_position: None,
            calculated_at: Utc.with_ymd_and_hms(2026, 2, 1, 6, 0, 0).single().expect("timestamp"),
        }
    }

    async fn fixture_state() -> ApiState {
        let domains = InMemoryDomainRepository::default();
        domains
            .push(TrackedDomain {
                id: DomainId("dom-1".to_string()),
                user_id: UserId("user-1".to_string()),
                hostname: "acme.dev".to_string(),
                created_at: Utc::now(),
            })
            .await;

        let metrics = InMemoryMetricsRepository::default();
        metrics.push(raw_record("uk", 9_000, 400, 50.0)).await;
        metrics.push(raw_record("gb", 3_000, 200, 70.0)).await;
        metrics.push(raw_record("zzz", 500, 20, 10.0)).await;

        let search = InMemorySearchSeriesRepository::default();
        for (day, impressions, clicks, position) in [
            (1, 0u64, 0u64, 5.0),
            (2, 100, 10, 3.0),
        ] {
            search
                .push(
                    UserId("user-1".to_string()),
                    DomainId("dom-1".to_string()),
                    PeriodRecord {
                        period: NaiveDate::from_ymd_opt(2026, 2, day).expect("valid date"),
                        clicks,
                        impressions,
                        avg_position: position,
                    },
                )
                .await;
        }

        ApiState {
            domains: Arc::new(domains),
            metrics: Arc::new(metrics),
            search: Arc::new(search),
            report_options: ReportOptions::default(),
        }
    }

    async fn get_json(
        state: ApiState,
        uri: &str,
        user: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().uri(uri);
        if let Some(user) = user {
            request = request.header(USER_HEADER, user);
        }

        let response = router(state)
            .oneshot(request.body(Body::empty()).expect("request should build"))
            .await
            .expect("router should respond");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };
        (status, json)
    }

    #[tokio::test]
    async fn requests_without_caller_identity_are_unauthorized() {
        let state = fixture_state().await;
        let (status, body) = get_json(state, "/api/v1/domains/dom-1/regions", None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing caller identity");
    }

    #[tokio::test]
    async fn foreign_domains_read_as_not_found() {
        let state = fixture_state().await;
        let (status, _) =
            get_json(state, "/api/v1/domains/dom-1/regions", Some("user-other")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn region_report_merges_aliases_and_drops_unattributable_rows() {
        let state = fixture_state().await;
        let (status, body) =
            get_json(state, "/api/v1/domains/dom-1/regions", Some("user-1")).await;

        assert_eq!(status, StatusCode::OK);
        let regions = body["regions"].as_array().expect("regions array");
        assert_eq!(regions.len(), 1, "uk+gb merge into gb; zzz is dropped");
        assert_eq!(regions[0]["region"], "gb");
        assert_eq!(regions[0]["impressions"], 12_000);
        assert_eq!(regions[0]["clicks"], 600);
        // (9000*50 + 3000*70) / 12000 = 55.0
        assert_eq!(regions[0]["overallVisibilityScore"], 55.0);
        assert_eq!(body["summary"]["totalRegions"], 1);
        assert_eq!(body["summary"]["topOpportunities"][0]["region"], "gb");
    }

    #[tokio::test]
    async fn search_summary_reports_weighted_ratios() {
        let state = fixture_state().await;
        let (status, body) =
            get_json(state, "/api/v1/domains/dom-1/summary", Some("user-1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalClicks"], 10);
        assert_eq!(body["totalImpressions"], 100);
        assert_eq!(body["avgCTR"], 10.0);
        assert_eq!(body["avgPosition"], 3.0);
        assert_eq!(body["trends"]["clicks"], 0.0);
    }

    #[tokio::test]
    async fn malformed_summary_dates_are_bad_requests() {
        let state = fixture_state().await;
        let (status, body) = get_json(
            state,
            "/api/v1/domains/dom-1/summary?start=02-01-2026",
            Some("user-1"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "start must be a YYYY-MM-DD date");
    }

    #[tokio::test]
    async fn domain_listing_is_scoped_to_the_caller() {
        let state = fixture_state().await;
        let (status, body) = get_json(state.clone(), "/api/v1/domains", Some("user-1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().expect("array").len(), 1);
        assert_eq!(body[0]["hostname"], "acme.dev");

        let (status, body) = get_json(state, "/api/v1/domains", Some("user-other")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().expect("array").len(), 0);
    }
}
