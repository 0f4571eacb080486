//! API Layer
//!
//! HTTP surface of the marketplace backend: the Shopify webhook receiver,
//! the affiliate redirect and health probes.

pub mod common;
pub mod health;
pub mod openapi;
pub mod redirect;
pub mod webhooks;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use axum::http::Method;

pub use common::*;
pub use health::{health_router, HealthResponse};
pub use openapi::ApiDoc;
pub use redirect::{redirect_router, tracking_url, RedirectState};
pub use webhooks::{webhooks_router, WebhookState};

use crate::repository::Repositories;
use crate::service::WebhookProcessor;

/// All application routes, without the operational layers the server adds.
pub fn create_router(processor: Arc<WebhookProcessor>, repos: &Repositories) -> Router {
    let redirect_state = RedirectState::new(repos, processor.config().store_timeout);

    // Redirect links are opened from any creator's page
    let redirect_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .nest("/webhooks", webhooks_router(WebhookState { processor }))
        .nest("/affiliate", redirect_router(redirect_state).layer(redirect_cors))
        .merge(health_router())
}
