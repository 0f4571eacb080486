//! Shopify Webhook Receiver
//!
//! `POST /webhooks/shopify`. The body is taken as raw bytes so the
//! signature is checked against exactly what was sent.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};

use crate::api::common::ApiError;
use crate::domain::WebhookEnvelope;
use crate::error::PlatformError;
use crate::service::WebhookProcessor;

pub const ALLOWED_METHODS: &str = "POST, GET, OPTIONS";
pub const ALLOWED_HEADERS: &str =
    "Content-Type, Authorization, X-Shopify-Hmac-Sha256, X-Shopify-Topic, X-Shopify-Shop-Domain";

#[derive(Clone)]
pub struct WebhookState {
    pub processor: Arc<WebhookProcessor>,
}

/// Receive a Shopify webhook
#[utoipa::path(
    post,
    path = "/webhooks/shopify",
    tag = "webhooks",
    request_body(content = String, description = "Raw webhook payload", content_type = "application/json"),
    params(
        ("X-Shopify-Hmac-Sha256" = String, Header, description = "Base64 HMAC-SHA256 of the raw body"),
        ("X-Shopify-Topic" = String, Header, description = "Event topic, e.g. orders/paid"),
        ("X-Shopify-Shop-Domain" = Option<String>, Header, description = "Sending shop")
    ),
    responses(
        (status = 200, description = "Webhook accepted", body = String),
        (status = 400, description = "Malformed payload or missing topic", body = ApiError),
        (status = 401, description = "Signature missing or invalid", body = ApiError),
        (status = 500, description = "Secret not configured or store failure", body = ApiError)
    )
)]
pub async fn receive_shopify_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, PlatformError> {
    let envelope = WebhookEnvelope::from_parts(&headers, body);
    state.processor.process(&envelope).await?;
    Ok("OK")
}

/// CORS preflight for browser-based webhook testers
pub async fn webhook_preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS),
        ],
    )
}

pub fn webhooks_router(state: WebhookState) -> Router {
    Router::new()
        .route("/shopify", post(receive_shopify_webhook).options(webhook_preflight))
        .with_state(state)
}
