//! Topic dispatch
//!
//! Turns a verified topic and raw body into a typed event. Bodies of
//! unhandled topics are never parsed.

use am_common::{ShopifyOrder, ShopifyProduct};
use serde::de::DeserializeOwned;

use crate::domain::WebhookTopic;
use crate::error::{PlatformError, Result};

#[derive(Debug, Clone)]
pub enum WebhookEvent {
    OrderCreated(ShopifyOrder),
    OrderUpdated(ShopifyOrder),
    OrderPaid(ShopifyOrder),
    ProductCreated(ShopifyProduct),
    ProductUpdated(ShopifyProduct),
    Unhandled(String),
}

impl WebhookEvent {
    pub fn parse(topic: &WebhookTopic, body: &[u8], shop_domain: &str) -> Result<Self> {
        let event = match topic {
            WebhookTopic::OrderCreated => Self::OrderCreated(decode(topic, body, shop_domain)?),
            WebhookTopic::OrderUpdated => Self::OrderUpdated(decode(topic, body, shop_domain)?),
            WebhookTopic::OrderPaid => Self::OrderPaid(decode(topic, body, shop_domain)?),
            WebhookTopic::ProductCreated => Self::ProductCreated(decode(topic, body, shop_domain)?),
            WebhookTopic::ProductUpdated => Self::ProductUpdated(decode(topic, body, shop_domain)?),
            WebhookTopic::Unhandled(name) => Self::Unhandled(name.clone()),
        };
        Ok(event)
    }

    pub fn topic(&self) -> WebhookTopic {
        match self {
            Self::OrderCreated(_) => WebhookTopic::OrderCreated,
            Self::OrderUpdated(_) => WebhookTopic::OrderUpdated,
            Self::OrderPaid(_) => WebhookTopic::OrderPaid,
            Self::ProductCreated(_) => WebhookTopic::ProductCreated,
            Self::ProductUpdated(_) => WebhookTopic::ProductUpdated,
            Self::Unhandled(name) => WebhookTopic::Unhandled(name.clone()),
        }
    }
}

fn decode<T: DeserializeOwned>(topic: &WebhookTopic, body: &[u8], shop_domain: &str) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| PlatformError::malformed(topic.as_str(), shop_domain, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOP: &str = "demo.myshopify.com";

    #[test]
    fn test_parse_paid_order() {
        let body = br#"{"id":1001,"total_price":"100.00","financial_status":"paid"}"#;
        let event = WebhookEvent::parse(&WebhookTopic::OrderPaid, body, SHOP).unwrap();

        match event {
            WebhookEvent::OrderPaid(order) => {
                assert_eq!(order.id, "1001");
                assert!(order.is_paid());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_parse_product() {
        let body = br#"{"id":7,"title":"Mug","variants":[{"price":"12.00"}]}"#;
        let event = WebhookEvent::parse(&WebhookTopic::ProductUpdated, body, SHOP).unwrap();
        assert_eq!(event.topic(), WebhookTopic::ProductUpdated);
    }

    #[test]
    fn test_malformed_body_carries_context() {
        let err = WebhookEvent::parse(&WebhookTopic::OrderCreated, b"{not json", SHOP).unwrap_err();

        match err {
            PlatformError::MalformedPayload { topic, shop_domain, .. } => {
                assert_eq!(topic, "orders/create");
                assert_eq!(shop_domain, SHOP);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unhandled_topic_skips_parsing() {
        let topic = WebhookTopic::parse("carts/update");
        let event = WebhookEvent::parse(&topic, b"definitely not json", SHOP).unwrap();
        assert!(matches!(event, WebhookEvent::Unhandled(name) if name == "carts/update"));
    }
}
