//! Inbound Webhook Envelope

use std::fmt;

use axum::http::HeaderMap;
use bytes::Bytes;

pub const HMAC_HEADER: &str = "x-shopify-hmac-sha256";
pub const TOPIC_HEADER: &str = "x-shopify-topic";
pub const SHOP_DOMAIN_HEADER: &str = "x-shopify-shop-domain";

/// One inbound webhook request, exactly as received.
///
/// `raw_body` is never re-serialized: the signature is checked against
/// these bytes.
#[derive(Debug, Clone)]
pub struct WebhookEnvelope {
    pub raw_body: Bytes,
    pub signature_header: Option<String>,
    pub topic: Option<String>,
    pub shop_domain: String,
}

impl WebhookEnvelope {
    pub fn new(
        raw_body: impl Into<Bytes>,
        signature_header: Option<String>,
        topic: Option<String>,
        shop_domain: impl Into<String>,
    ) -> Self {
        Self {
            raw_body: raw_body.into(),
            signature_header,
            topic,
            shop_domain: shop_domain.into(),
        }
    }

    pub fn from_parts(headers: &HeaderMap, raw_body: Bytes) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            raw_body,
            signature_header: header(HMAC_HEADER),
            topic: header(TOPIC_HEADER),
            shop_domain: header(SHOP_DOMAIN_HEADER).unwrap_or_default(),
        }
    }
}

/// Webhook topics the marketplace acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookTopic {
    OrderCreated,
    OrderUpdated,
    OrderPaid,
    ProductCreated,
    ProductUpdated,
    /// Anything else; acknowledged and ignored
    Unhandled(String),
}

impl WebhookTopic {
    pub fn parse(topic: &str) -> Self {
        match topic {
            "orders/create" => WebhookTopic::OrderCreated,
            "orders/updated" | "orders/update" => WebhookTopic::OrderUpdated,
            "orders/paid" => WebhookTopic::OrderPaid,
            "products/create" => WebhookTopic::ProductCreated,
            "products/update" => WebhookTopic::ProductUpdated,
            other => WebhookTopic::Unhandled(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            WebhookTopic::OrderCreated => "orders/create",
            WebhookTopic::OrderUpdated => "orders/updated",
            WebhookTopic::OrderPaid => "orders/paid",
            WebhookTopic::ProductCreated => "products/create",
            WebhookTopic::ProductUpdated => "products/update",
            WebhookTopic::Unhandled(topic) => topic,
        }
    }
}

impl fmt::Display for WebhookTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_topic_parsing() {
        assert_eq!(WebhookTopic::parse("orders/create"), WebhookTopic::OrderCreated);
        assert_eq!(WebhookTopic::parse("orders/updated"), WebhookTopic::OrderUpdated);
        assert_eq!(WebhookTopic::parse("orders/update"), WebhookTopic::OrderUpdated);
        assert_eq!(WebhookTopic::parse("orders/paid"), WebhookTopic::OrderPaid);
        assert_eq!(WebhookTopic::parse("products/create"), WebhookTopic::ProductCreated);
        assert_eq!(WebhookTopic::parse("products/update"), WebhookTopic::ProductUpdated);
        assert_eq!(
            WebhookTopic::parse("carts/update"),
            WebhookTopic::Unhandled("carts/update".to_string())
        );
    }

    #[test]
    fn test_topic_is_case_sensitive() {
        assert!(matches!(WebhookTopic::parse("Orders/Paid"), WebhookTopic::Unhandled(_)));
    }

    #[test]
    fn test_envelope_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(HMAC_HEADER, HeaderValue::from_static("abc="));
        headers.insert(TOPIC_HEADER, HeaderValue::from_static("orders/paid"));
        headers.insert(SHOP_DOMAIN_HEADER, HeaderValue::from_static("demo.myshopify.com"));

        let envelope = WebhookEnvelope::from_parts(&headers, Bytes::from_static(b"{}"));

        assert_eq!(envelope.signature_header.as_deref(), Some("abc="));
        assert_eq!(envelope.topic.as_deref(), Some("orders/paid"));
        assert_eq!(envelope.shop_domain, "demo.myshopify.com");
        assert_eq!(&envelope.raw_body[..], b"{}");
    }

    #[test]
    fn test_envelope_missing_headers() {
        let envelope = WebhookEnvelope::from_parts(&HeaderMap::new(), Bytes::new());

        assert!(envelope.signature_header.is_none());
        assert!(envelope.topic.is_none());
        assert_eq!(envelope.shop_domain, "");
    }
}
