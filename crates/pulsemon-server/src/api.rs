use crate::html;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use pulsemon_common::{Metric, MetricError, MetricId};
use pulsemon_storage::StorageError;
use serde_json::json;

/// API error carrying the HTTP status and a JSON `{"error": ...}` body.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<MetricError> for ApiError {
    fn from(err: MetricError) -> Self {
        // An unusable metric name addresses no slot at all, hence 404; a bad
        // kind or value is a malformed request.
        let status = match err {
            MetricError::InvalidName => StatusCode::NOT_FOUND,
            MetricError::InvalidKind(_)
            | MetricError::InvalidCounterValue(_)
            | MetricError::InvalidGaugeValue(_) => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        tracing::error!(error = %err, "storage failure");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal server error".to_string(),
        }
    }
}

/// `POST /update/{kind}/{name}/{value}`: string-encoded single update.
pub async fn update_path(
    State(state): State<AppState>,
    Path((kind, name, value)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    let metric = Metric::from_string_value(&kind, &name, &value)?;
    state.service.update(vec![metric])?;
    Ok(StatusCode::OK)
}

/// `POST /update`: JSON body single update; echoes the accepted metric.
pub async fn update_body(
    State(state): State<AppState>,
    Json(metric): Json<Metric>,
) -> Result<Json<Metric>, ApiError> {
    metric.validate()?;
    state.service.update(vec![metric.clone()])?;
    Ok(Json(metric))
}

/// `GET /value/{kind}/{name}`: plain-text current value.
pub async fn value_path(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<String, ApiError> {
    if name.is_empty() {
        return Err(MetricError::InvalidName.into());
    }
    let id = MetricId::new(name, kind.parse()?);
    match state.service.get(&id)? {
        Some(metric) => Ok(metric.value_string()),
        None => Err(ApiError::not_found("metric not found")),
    }
}

/// `POST /value`: JSON identity body; returns the stored metric.
pub async fn value_body(
    State(state): State<AppState>,
    Json(id): Json<MetricId>,
) -> Result<Json<Metric>, ApiError> {
    if id.name.is_empty() {
        return Err(MetricError::InvalidName.into());
    }
    match state.service.get(&id)? {
        Some(metric) => Ok(Json(metric)),
        None => Err(ApiError::not_found("metric not found")),
    }
}

/// `GET /`: HTML table of all stored metrics.
pub async fn list_html(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let metrics = state.service.list()?;
    Ok(Html(html::render_metrics(&metrics)))
}

/// `GET /healthz`: liveness with uptime.
pub async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    let uptime = (Utc::now() - state.start_time).num_seconds();
    Json(json!({ "status": "ok", "uptime_secs": uptime }))
}
