use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

pub mod logging;

// ============================================================================
// Shopify Order Payloads
// ============================================================================

/// Order payload delivered with the `orders/*` webhook topics.
///
/// Only the fields the marketplace reads are modelled; everything else the
/// platform sends is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyOrder {
    #[serde(deserialize_with = "deserialize_platform_id")]
    pub id: String,
    /// Decimal string on the wire, e.g. `"100.00"`
    #[serde(default)]
    pub total_price: Option<Decimal>,
    #[serde(default)]
    pub financial_status: Option<FinancialStatus>,
    #[serde(default)]
    pub note_attributes: Option<Vec<NoteAttribute>>,
    #[serde(default)]
    pub landing_site: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl ShopifyOrder {
    pub fn note_attributes(&self) -> &[NoteAttribute] {
        self.note_attributes.as_deref().unwrap_or_default()
    }

    pub fn is_paid(&self) -> bool {
        self.financial_status == Some(FinancialStatus::Paid)
    }
}

/// Cart/checkout attribute carried through to the order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteAttribute {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl NoteAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialStatus {
    Pending,
    Authorized,
    PartiallyPaid,
    Paid,
    PartiallyRefunded,
    Refunded,
    Voided,
    #[serde(other)]
    Other,
}

impl FinancialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinancialStatus::Pending => "pending",
            FinancialStatus::Authorized => "authorized",
            FinancialStatus::PartiallyPaid => "partially_paid",
            FinancialStatus::Paid => "paid",
            FinancialStatus::PartiallyRefunded => "partially_refunded",
            FinancialStatus::Refunded => "refunded",
            FinancialStatus::Voided => "voided",
            FinancialStatus::Other => "other",
        }
    }
}

// ============================================================================
// Shopify Product Payloads
// ============================================================================

/// Product payload delivered with the `products/*` webhook topics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyProduct {
    #[serde(deserialize_with = "deserialize_platform_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    /// `active`, `draft` or `archived`
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub variants: Option<Vec<ShopifyVariant>>,
    #[serde(default)]
    pub image: Option<ShopifyImage>,
}

impl ShopifyProduct {
    /// Price of the first variant, which is what the storefront lists.
    pub fn list_price(&self) -> Option<Decimal> {
        self.variants
            .as_deref()
            .and_then(|variants| variants.first())
            .and_then(|variant| variant.price)
    }

    pub fn is_active(&self) -> bool {
        self.status.as_deref().map_or(true, |s| s == "active")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyVariant {
    #[serde(default)]
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyImage {
    pub src: String,
}

/// Platform ids arrive as JSON numbers from the admin API and as strings
/// from some replay tools; both are kept as strings.
fn deserialize_platform_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n.to_string()),
        RawId::Text(s) if !s.is_empty() => Ok(s),
        RawId::Text(_) => Err(serde::de::Error::custom("platform id must not be empty")),
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("Unknown log format: {0}")]
    UnknownLogFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_from_webhook_json() {
        let json = r#"{
            "id": 820982911946154508,
            "total_price": "199.99",
            "financial_status": "paid",
            "note_attributes": [{"name": "affiliate_code", "value": "CREATOR1"}],
            "landing_site": "/products/widget?ref=OTHER",
            "line_items": []
        }"#;

        let order: ShopifyOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, "820982911946154508");
        assert_eq!(order.total_price, Some(dec!(199.99)));
        assert!(order.is_paid());
        assert_eq!(order.note_attributes().len(), 1);
    }

    #[test]
    fn test_order_with_null_attributes() {
        let json = r#"{"id": "42", "note_attributes": null, "landing_site": null}"#;

        let order: ShopifyOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, "42");
        assert!(order.note_attributes().is_empty());
        assert!(order.total_price.is_none());
        assert!(!order.is_paid());
    }

    #[test]
    fn test_unknown_financial_status() {
        let json = r#"{"id": 1, "financial_status": "expired"}"#;

        let order: ShopifyOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.financial_status, Some(FinancialStatus::Other));
    }

    #[test]
    fn test_empty_id_rejected() {
        let json = r#"{"id": ""}"#;
        assert!(serde_json::from_str::<ShopifyOrder>(json).is_err());
    }

    #[test]
    fn test_product_list_price_and_status() {
        let json = r#"{
            "id": 632910392,
            "title": "IPod Nano - 8GB",
            "handle": "ipod-nano",
            "status": "draft",
            "variants": [{"price": "199.00"}, {"price": "249.00"}]
        }"#;

        let product: ShopifyProduct = serde_json::from_str(json).unwrap();
        assert_eq!(product.list_price(), Some(dec!(199.00)));
        assert!(!product.is_active());
    }
}
