// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. The surface is read-only and
// unauthenticated; CORS is configured permissively so dashboards can call it
// from anywhere.
//
//   GET /health                      liveness + uptime
//   GET /prediction/:coin_id?days=N  full multi-source prediction
//   GET /sources/news/:coin_id       classified news payload
//   GET /sources/funding/:coin_id    funding rate payload
//   GET /sources/market/:coin_id     positioning payload
//   GET /sources/fear-greed          index reading + stance
//   GET /monitor                     upstream API usage counters
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::app_state::AppState;
use crate::sentiment;
use crate::service::CoinPrediction;
use crate::sources::{FundingSnapshot, MarketSnapshot, NewsSnapshot};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/prediction/:coin_id", get(prediction))
        .route("/api/v1/sources/news/:coin_id", get(news_source))
        .route("/api/v1/sources/funding/:coin_id", get(funding_source))
        .route("/api/v1/sources/market/:coin_id", get(market_source))
        .route("/api/v1/sources/fear-greed", get(fear_greed_source))
        .route("/api/v1/monitor", get(monitor_usage))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Error envelope
// =============================================================================

/// Typed rejection for every handler: a 400 for caller mistakes, a 502 when
/// an upstream provider fails a request we could not degrade.
pub enum ApiError {
    BadRequest(String),
    Upstream(String),
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn upstream(err: anyhow::Error) -> Self {
        // `{:#}` flattens the context chain into one line.
        Self::Upstream(format!("{err:#}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Upstream(message) => {
                warn!(error = %message, "upstream failure surfaced to client");
                (StatusCode::BAD_GATEWAY, message)
            }
        };
        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        uptime_seconds: state.uptime_seconds(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Prediction
// =============================================================================

#[derive(Deserialize)]
struct PredictionQuery {
    days: Option<u32>,
}

fn validate_days(days: u32) -> Result<(), ApiError> {
    if (1..=365).contains(&days) {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "days must be between 1 and 365, got {days}"
        )))
    }
}

async fn prediction(
    State(state): State<Arc<AppState>>,
    Path(coin_id): Path<String>,
    Query(query): Query<PredictionQuery>,
) -> Result<Json<CoinPrediction>, ApiError> {
    let days = query.days.unwrap_or(state.config.default_days);
    validate_days(days)?;

    let prediction = state
        .service
        .predict(&coin_id, days)
        .await
        .map_err(ApiError::upstream)?;
    Ok(Json(prediction))
}

// =============================================================================
// Source payloads
// =============================================================================

async fn news_source(
    State(state): State<Arc<AppState>>,
    Path(coin_id): Path<String>,
) -> Result<Json<NewsSnapshot>, ApiError> {
    let snapshot = state.news.fetch(&coin_id).await.map_err(ApiError::upstream)?;
    Ok(Json(snapshot))
}

async fn funding_source(
    State(state): State<Arc<AppState>>,
    Path(coin_id): Path<String>,
) -> Result<Json<FundingSnapshot>, ApiError> {
    let snapshot = state
        .funding
        .fetch(&coin_id)
        .await
        .map_err(ApiError::upstream)?;
    Ok(Json(snapshot))
}

async fn market_source(
    State(state): State<Arc<AppState>>,
    Path(coin_id): Path<String>,
) -> Result<Json<MarketSnapshot>, ApiError> {
    let snapshot = state
        .market
        .fetch(&coin_id)
        .await
        .map_err(ApiError::upstream)?;
    Ok(Json(snapshot))
}

/// The index payload plus the contrarian read on it, so a dashboard gets the
/// stance and wording without reimplementing the scale.
async fn fear_greed_source(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.fear_greed.fetch().await;
    let body = serde_json::json!({
        "value": snapshot.value,
        "classification": snapshot.classification,
        "timestamp": snapshot.timestamp,
        "cached": snapshot.cached,
        "fetched_at": snapshot.fetched_at,
        "stance": sentiment::stance(snapshot.value),
        "recommendation": sentiment::describe(snapshot.value),
        "contrarian_score": sentiment::score_from_fear_greed(snapshot.value),
    });
    Json(body)
}

// =============================================================================
// Usage monitor
// =============================================================================

async fn monitor_usage(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.monitor.snapshot())
}

// =============================================================================
// Tests
// =============================================================================
