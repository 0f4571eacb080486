//! OpenAPI Documentation

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Affiliate Market API",
        version = "1.0.0",
        description = "Shopify webhook intake and affiliate link redirects"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "webhooks", description = "Inbound Shopify webhooks"),
        (name = "affiliate", description = "Affiliate link tracking"),
        (name = "monitoring", description = "Health and readiness")
    ),
    paths(
        super::webhooks::receive_shopify_webhook,
        super::redirect::affiliate_redirect,
        super::health::health,
        super::health::ready,
    ),
    components(
        schemas(
            super::common::ApiError,
            super::health::HealthResponse,
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/webhooks/shopify"));
        assert!(paths.iter().any(|p| p.as_str() == "/affiliate/redirect"));
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
    }
}
