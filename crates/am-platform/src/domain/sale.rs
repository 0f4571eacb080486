//! Sale Record
//!
//! Written once per paid, attributed order. Carries the full commission
//! split so dashboards never recompute it.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use rust_decimal::Decimal;

pub type SaleId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    #[serde(rename = "_id")]
    pub id: SaleId,

    /// Together with `source_topic`, the idempotency key for re-delivered webhooks
    pub shopify_order_id: String,

    pub source_topic: String,

    pub shop_domain: String,

    pub affiliate_link_id: String,

    pub affiliate_code: String,

    pub product_id: String,

    pub creator_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_owner_id: Option<String>,

    pub sale_amount: Decimal,

    pub commission_rate: Decimal,

    pub commission_amount: Decimal,

    pub platform_fee: Decimal,

    pub creator_earnings: Decimal,

    pub store_owner_earnings: Decimal,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub sale_date: DateTime<Utc>,

    pub status: SaleStatus,
}

impl SaleRecord {
    /// Idempotency key used by store adapters
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.shopify_order_id, &self.source_topic)
    }
}
