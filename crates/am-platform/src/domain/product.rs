//! Product Entity
//!
//! Products are listed by store owners with a commission rate and promoted
//! by creators. Catalog fields are kept in sync from product webhooks; the
//! commission rate is only ever set by the owner.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use rust_decimal::Decimal;

use am_common::ShopifyProduct;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopify_product_id: Option<String>,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub price: Decimal,

    /// Percentage of the sale owed to the referring creator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<Decimal>,

    pub product_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_owner_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_domain: Option<String>,

    pub is_active: bool,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(title: impl Into<String>, price: Decimal, product_url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            shopify_product_id: None,
            title: title.into(),
            description: None,
            price,
            commission_rate: None,
            product_url: product_url.into(),
            image_url: None,
            store_owner_id: None,
            shop_domain: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_commission_rate(mut self, rate: Decimal) -> Self {
        self.commission_rate = Some(rate);
        self
    }

    pub fn with_store_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.store_owner_id = Some(owner_id.into());
        self
    }

    /// New catalog entry created from a product webhook
    pub fn from_sync(sync: &ProductSync) -> Self {
        let mut product = Self::new(sync.title.clone(), sync.price, sync.product_url.clone());
        product.shopify_product_id = Some(sync.shopify_product_id.clone());
        product.shop_domain = Some(sync.shop_domain.clone());
        product.store_owner_id = sync.store_owner_id.clone();
        product.apply_sync(sync);
        product
    }

    /// Overwrite catalog fields, keeping identity, ownership and commission rate
    pub fn apply_sync(&mut self, sync: &ProductSync) {
        self.title = sync.title.clone();
        self.description = sync.description.clone();
        self.price = sync.price;
        self.product_url = sync.product_url.clone();
        self.image_url = sync.image_url.clone();
        self.is_active = sync.is_active;
        if self.store_owner_id.is_none() {
            self.store_owner_id = sync.store_owner_id.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// Catalog fields a product webhook is allowed to write
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSync {
    pub shopify_product_id: String,
    pub shop_domain: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub product_url: String,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub store_owner_id: Option<String>,
}

impl ProductSync {
    pub fn from_shopify(
        product: &ShopifyProduct,
        shop_domain: &str,
        store_owner_id: Option<String>,
    ) -> Self {
        let handle = product.handle.clone().unwrap_or_else(|| product.id.clone());
        Self {
            shopify_product_id: product.id.clone(),
            shop_domain: shop_domain.to_string(),
            title: product.title.clone(),
            description: product.body_html.clone(),
            price: product.list_price().unwrap_or_default(),
            product_url: format!("https://{}/products/{}", shop_domain, handle),
            image_url: product.image.as_ref().map(|image| image.src.clone()),
            is_active: product.is_active(),
            store_owner_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn shopify_product() -> ShopifyProduct {
        serde_json::from_value(serde_json::json!({
            "id": 632910392,
            "title": "Premium Wireless Headphones",
            "body_html": "<p>Noise cancelling</p>",
            "handle": "premium-wireless-headphones",
            "status": "active",
            "variants": [{"price": "199.99"}],
            "image": {"src": "https://cdn.example/headphones.png"}
        }))
        .unwrap()
    }

    #[test]
    fn test_sync_from_shopify_product() {
        let sync = ProductSync::from_shopify(&shopify_product(), "demo.myshopify.com", Some("owner-1".into()));

        assert_eq!(sync.shopify_product_id, "632910392");
        assert_eq!(sync.price, dec!(199.99));
        assert_eq!(
            sync.product_url,
            "https://demo.myshopify.com/products/premium-wireless-headphones"
        );
        assert_eq!(sync.image_url.as_deref(), Some("https://cdn.example/headphones.png"));
        assert!(sync.is_active);
    }

    #[test]
    fn test_apply_sync_keeps_commission_rate() {
        let mut product = Product::new("Old title", dec!(150), "https://old.example/p")
            .with_commission_rate(dec!(15))
            .with_store_owner("owner-1");
        let id = product.id.clone();

        let sync = ProductSync::from_shopify(&shopify_product(), "demo.myshopify.com", Some("owner-2".into()));
        product.apply_sync(&sync);

        assert_eq!(product.id, id);
        assert_eq!(product.title, "Premium Wireless Headphones");
        assert_eq!(product.price, dec!(199.99));
        assert_eq!(product.commission_rate, Some(dec!(15)));
        assert_eq!(product.store_owner_id.as_deref(), Some("owner-1"));
    }

    #[test]
    fn test_from_sync_has_no_commission_rate() {
        let sync = ProductSync::from_shopify(&shopify_product(), "demo.myshopify.com", None);
        let product = Product::from_sync(&sync);

        assert_eq!(product.shopify_product_id.as_deref(), Some("632910392"));
        assert!(product.commission_rate.is_none());
        assert_eq!(product.shop_domain.as_deref(), Some("demo.myshopify.com"));
    }
}
