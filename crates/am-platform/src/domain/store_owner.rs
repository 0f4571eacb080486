//! Store Owner Entity

use serde::{Deserialize, Serialize};

/// Marketplace user who connected a Shopify store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreOwner {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// `*.myshopify.com` domain sent in the shop-domain header
    pub shop_domain: String,
}

impl StoreOwner {
    pub fn new(id: impl Into<String>, shop_domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            shop_domain: shop_domain.into(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
