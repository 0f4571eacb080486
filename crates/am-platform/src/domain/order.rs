//! Attributed Order Record

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use rust_decimal::Decimal;

/// An order that reached the store through an affiliate code.
///
/// Keyed by `shopify_order_id`: `orders/create` and `orders/updated` for the
/// same order converge on one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    #[serde(rename = "_id")]
    pub id: String,

    pub shopify_order_id: String,

    pub shop_domain: String,

    pub affiliate_code: String,

    pub total_price: Decimal,

    /// Platform financial status, e.g. `pending` or `paid`
    pub order_status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_owner_id: Option<String>,

    /// Set once the order is paid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub received_at: DateTime<Utc>,
}
