//! Health API

use axum::{routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl HealthResponse {
    fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "monitoring",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::new("UP"))
}

#[utoipa::path(
    get,
    path = "/ready",
    tag = "monitoring",
    responses(
        (status = 200, description = "Service is ready for traffic", body = HealthResponse)
    )
)]
pub async fn ready() -> Json<HealthResponse> {
    Json(HealthResponse::new("READY"))
}

pub fn health_router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
}
