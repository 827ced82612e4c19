use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Json;
use serde_json::{json, Value};

use throttl_common::{ApiConfig, ApiConfigInput, PredictedStatus, Stored, UsageEventInput};

use super::AppState;
use crate::error::ApiError;
use crate::service::HealthReport;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn register_api(
    State(service): State<AppState>,
    payload: Result<Json<ApiConfigInput>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(input) = payload?;
    let api = service.register_api(input).await?;
    Ok(Json(json!({ "api": api })))
}

pub async fn list_apis(State(service): State<AppState>) -> ApiResult<Vec<Stored<ApiConfig>>> {
    Ok(Json(service.list_apis().await?))
}

pub async fn get_api(
    State(service): State<AppState>,
    Path(api_id): Path<String>,
) -> ApiResult<Stored<ApiConfig>> {
    Ok(Json(service.get_api(&api_id).await?))
}

pub async fn record_usage(
    State(service): State<AppState>,
    payload: Result<Json<UsageEventInput>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(input) = payload?;
    let event = service.record_usage(input).await?;
    Ok(Json(json!({ "ok": true, "event": event })))
}

pub async fn status(
    State(service): State<AppState>,
    Path(api_id): Path<String>,
) -> ApiResult<PredictedStatus> {
    Ok(Json(service.status(&api_id).await?))
}

pub async fn health(State(service): State<AppState>) -> Json<HealthReport> {
    Json(service.health().await)
}

pub async fn version() -> Json<Value> {
    Json(json!({
        "service": "throttl",
        "version": crate::THROTTL_VERSION,
        "description": "API usage tracking and rate-limit projection",
    }))
}
