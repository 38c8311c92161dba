use crate::state::AppState;
use crate::{api, logging};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

pub fn build_http_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::list_html))
        .route("/healthz", get(api::healthz))
        .route("/update", post(api::update_body))
        .route("/update/{kind}/{name}/{value}", post(api::update_path))
        .route("/value", post(api::value_body))
        .route("/value/{kind}/{name}", get(api::value_path))
        .with_state(state)
        .layer(middleware::from_fn(logging::request_logging))
}
