//! HTTP server exposing the species query engine
//!
//! Handlers await the async engine directly; a long-running fetch
//! never blocks the scheduler, and no two fetches run for a single
//! request.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use inat_diff::fetch::RetryPolicy;
use inat_diff::query::SpeciesQuery;
use inat_diff::{html, report, DiffError, InatClient, QualityAnnotator, DEFAULT_LOOKBACK_YEARS};

use crate::types::{ErrorResponse, HealthResponse};

/// Shared state for the HTTP server
pub struct ServerState {
    pub engine: SpeciesQuery,
    pub quality: QualityAnnotator,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(engine: SpeciesQuery) -> Self {
        Self {
            engine,
            quality: QualityAnnotator::new(InatClient::new()),
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Query parameters for `/new-species`
#[derive(Deserialize)]
pub struct NewSpeciesParams {
    region: String,
    period: String,
    #[serde(default)]
    taxon: Option<String>,
    #[serde(default = "default_lookback")]
    lookback_years: u32,
    #[serde(default = "default_rate_limit")]
    rate_limit: f64,
    #[serde(default)]
    quality: bool,
    #[serde(default = "default_format")]
    format: String,
}

/// Query parameters for `/species`
#[derive(Deserialize)]
pub struct SpeciesListParams {
    region: String,
    period: String,
    #[serde(default = "default_format")]
    format: String,
}

/// Query parameters for `/query`
#[derive(Deserialize)]
pub struct ObservationParams {
    taxon: String,
    region: String,
    period: String,
}

fn default_lookback() -> u32 {
    DEFAULT_LOOKBACK_YEARS
}

fn default_rate_limit() -> f64 {
    1.2
}

fn default_format() -> String {
    "json".to_string()
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/new-species", get(new_species))
        .route("/species", get(list_species))
        .route("/query", get(query_observations))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = format!("0.0.0.0:{}", port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await
}

async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime = Utc::now()
        .signed_duration_since(state.started_at)
        .num_seconds()
        .max(0) as u64;
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime,
    })
}

async fn new_species(
    State(state): State<SharedState>,
    Query(params): Query<NewSpeciesParams>,
) -> Response {
    let policy = RetryPolicy::with_rate_limit(Duration::from_secs_f64(params.rate_limit.max(0.0)));

    let result = state
        .engine
        .find_all_new_species(
            &params.period,
            &params.region,
            params.taxon.as_deref(),
            params.lookback_years,
            &policy,
        )
        .await;

    match result {
        Ok(mut report_data) => {
            if params.quality {
                state
                    .quality
                    .annotate(
                        &mut report_data.new_species,
                        Some(report_data.query.place_id),
                        policy.rate_limit,
                    )
                    .await;
            }
            match params.format.as_str() {
                "html" => Html(html::render_new_species_html(&report_data)).into_response(),
                "markdown" => report::render_new_species_markdown(&report_data).into_response(),
                _ => Json(report_data).into_response(),
            }
        }
        Err(err) => error_response(err),
    }
}

async fn list_species(
    State(state): State<SharedState>,
    Query(params): Query<SpeciesListParams>,
) -> Response {
    let result = state
        .engine
        .list_species_in_period(&params.period, &params.region, &RetryPolicy::default())
        .await;

    match result {
        Ok(report_data) => match params.format.as_str() {
            "html" => Html(html::render_species_list_html(&report_data)).into_response(),
            _ => Json(report_data).into_response(),
        },
        Err(err) => error_response(err),
    }
}

async fn query_observations(
    State(state): State<SharedState>,
    Query(params): Query<ObservationParams>,
) -> Response {
    let result = state
        .engine
        .query_species_in_period(&params.taxon, &params.period, &params.region)
        .await;

    match result {
        Ok(report_data) => Json(report_data).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: DiffError) -> Response {
    let status = match &err {
        DiffError::PlaceNotFound(_) | DiffError::TaxonNotFound(_) => StatusCode::NOT_FOUND,
        DiffError::InvalidTimeFormat(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn create_test_state() -> SharedState {
        Arc::new(ServerState::new(SpeciesQuery::new()))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["status"], "ok");
        assert!(json["uptime_secs"].as_u64().is_some());
    }

    #[tokio::test]
    async fn test_new_species_missing_params() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/new-species")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // Missing required 'region' and 'period' should return 400
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_query_missing_taxon() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/query?region=Oregon&period=this%20month")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
