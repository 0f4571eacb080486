//! Affiliate Redirect
//!
//! `GET /affiliate/redirect?code=X` counts a click on the creator's link and
//! sends the shopper to the product page with the code attached, so the
//! storefront can carry it into the order's note attributes.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::IntoParams;

use crate::api::common::ApiError;
use crate::error::PlatformError;
use crate::repository::{with_timeout, AffiliateLinkRepository, ProductRepository, Repositories};

#[derive(Clone)]
pub struct RedirectState {
    pub links: Arc<dyn AffiliateLinkRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub store_timeout: Duration,
}

impl RedirectState {
    pub fn new(repos: &Repositories, store_timeout: Duration) -> Self {
        Self {
            links: repos.links.clone(),
            products: repos.products.clone(),
            store_timeout,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RedirectParams {
    /// Affiliate code shared by the creator
    pub code: Option<String>,
}

#[utoipa::path(
    get,
    path = "/affiliate/redirect",
    tag = "affiliate",
    params(RedirectParams),
    responses(
        (status = 302, description = "Redirect to the product page"),
        (status = 400, description = "Missing affiliate code", body = ApiError),
        (status = 404, description = "Unknown code or product", body = ApiError)
    )
)]
pub async fn affiliate_redirect(
    State(state): State<RedirectState>,
    Query(params): Query<RedirectParams>,
) -> Result<Response, PlatformError> {
    let code = params
        .code
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| PlatformError::validation("Missing affiliate code"))?;

    let link = with_timeout(state.store_timeout, state.links.find_by_code(&code))
        .await?
        .ok_or_else(|| PlatformError::not_found("AffiliateLink", &code))?;

    let product = with_timeout(state.store_timeout, state.products.find_by_id(&link.product_id))
        .await?
        .ok_or_else(|| PlatformError::not_found("Product", &link.product_id))?;

    let links = state.links.clone();
    let link_id = link.id.clone();
    let timeout = state.store_timeout;
    tokio::spawn(async move {
        if let Err(e) = with_timeout(timeout, links.increment_clicks(&link_id)).await {
            warn!(link_id = %link_id, error = %e, "Failed to count affiliate click");
        }
    });

    let location = tracking_url(&product.product_url, &code);
    let location = HeaderValue::from_str(&location)
        .map_err(|_| PlatformError::internal(format!("Product {} has an invalid URL", product.id)))?;

    info!(affiliate_code = %code, product_id = %product.id, "Affiliate redirect");
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Product URL with the referral and UTM parameters appended, keeping any
/// existing query and fragment.
pub fn tracking_url(product_url: &str, code: &str) -> String {
    let (base, fragment) = match product_url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (product_url, None),
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    let code = urlencoding::encode(code);

    let mut url = format!(
        "{base}{separator}ref={code}&utm_source=affiliate&utm_medium=referral\
         &utm_campaign=affiliate_program&attributes%5Baffiliate_code%5D={code}"
    );
    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    url
}

pub fn redirect_router(state: RedirectState) -> Router {
    Router::new()
        .route("/redirect", get(affiliate_redirect))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_url_plain() {
        assert_eq!(
            tracking_url("https://shop.example/products/mug", "CREATOR1"),
            "https://shop.example/products/mug?ref=CREATOR1&utm_source=affiliate&utm_medium=referral\
             &utm_campaign=affiliate_program&attributes%5Baffiliate_code%5D=CREATOR1"
        );
    }

    #[test]
    fn test_tracking_url_existing_query_and_fragment() {
        let url = tracking_url("https://shop.example/products/mug?variant=7#details", "A B");
        assert!(url.starts_with("https://shop.example/products/mug?variant=7&ref=A%20B&"));
        assert!(url.ends_with("attributes%5Baffiliate_code%5D=A%20B#details"));
        assert_eq!(url.matches('?').count(), 1);
    }
}
