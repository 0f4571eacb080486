//! Affiliate Link Entity
//!
//! A creator's trackable link for one product. The `affiliate_code` is the
//! opaque token that travels through the storefront and back in order
//! webhooks.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffiliateLink {
    #[serde(rename = "_id")]
    pub id: String,

    /// Unique code shared by the creator
    pub affiliate_code: String,

    pub product_id: String,

    pub creator_id: String,

    /// Redirects served for this link
    #[serde(default)]
    pub clicks: i64,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl AffiliateLink {
    pub fn new(
        affiliate_code: impl Into<String>,
        product_id: impl Into<String>,
        creator_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            affiliate_code: affiliate_code.into(),
            product_id: product_id.into(),
            creator_id: creator_id.into(),
            clicks: 0,
            created_at: Utc::now(),
        }
    }
}
