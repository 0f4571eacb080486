//! Write planning
//!
//! One pure planner per event kind. Planners receive the parsed payload and
//! whatever the processor already looked up, and describe the writes to
//! make. Nothing here touches the store.

use am_common::{ShopifyOrder, ShopifyProduct};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{AffiliateLink, OrderRecord, Product, ProductSync, SaleRecord, SaleStatus, WebhookTopic};
use crate::error::{PlatformError, Result};
use crate::service::attribution::AffiliateAttribution;
use crate::service::commission::CommissionSplit;

#[derive(Debug, Clone, PartialEq)]
pub enum IntendedWrite {
    Order(OrderRecord),
    Sale(SaleRecord),
    ProductSync(ProductSync),
}

/// Where the commission rate of a sale came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Product,
    /// Product missing or carrying no rate
    Default,
}

/// Everything a paid order needs besides its own payload
#[derive(Debug, Clone)]
pub struct SaleContext {
    pub link: AffiliateLink,
    pub commission_rate: Decimal,
    pub store_owner_id: Option<String>,
}

pub fn resolve_rate(product: Option<&Product>, default_rate: Decimal) -> (Decimal, RateSource) {
    match product.and_then(|p| p.commission_rate) {
        Some(rate) => (rate, RateSource::Product),
        None => (default_rate, RateSource::Default),
    }
}

/// `orders/create` and `orders/updated`: record the attributed order
pub fn plan_order(
    order: &ShopifyOrder,
    attribution: &AffiliateAttribution,
    shop_domain: &str,
    store_owner_id: Option<String>,
    now: DateTime<Utc>,
) -> Vec<IntendedWrite> {
    let Some(code) = attribution.code() else {
        return Vec::new();
    };

    let order_status = order
        .financial_status
        .map(|s| s.as_str())
        .unwrap_or("pending")
        .to_string();

    vec![IntendedWrite::Order(OrderRecord {
        id: uuid::Uuid::new_v4().to_string(),
        shopify_order_id: order.id.clone(),
        shop_domain: shop_domain.to_string(),
        affiliate_code: code.to_string(),
        total_price: order.total_price.unwrap_or_default(),
        order_status,
        store_owner_id,
        processed_at: order.is_paid().then_some(now),
        received_at: now,
    })]
}

/// `orders/paid`: compute the split and record the sale
pub fn plan_sale(
    order: &ShopifyOrder,
    attribution: &AffiliateAttribution,
    shop_domain: &str,
    context: Option<&SaleContext>,
    now: DateTime<Utc>,
) -> Result<Vec<IntendedWrite>> {
    let (Some(code), Some(context)) = (attribution.code(), context) else {
        return Ok(Vec::new());
    };

    let sale_amount = order.total_price.ok_or_else(|| {
        PlatformError::malformed(
            WebhookTopic::OrderPaid.as_str(),
            shop_domain,
            format!("order {} has no total_price", order.id),
        )
    })?;
    let split = CommissionSplit::compute(sale_amount, context.commission_rate)?;

    Ok(vec![IntendedWrite::Sale(SaleRecord {
        id: uuid::Uuid::new_v4().to_string(),
        shopify_order_id: order.id.clone(),
        source_topic: WebhookTopic::OrderPaid.as_str().to_string(),
        shop_domain: shop_domain.to_string(),
        affiliate_link_id: context.link.id.clone(),
        affiliate_code: code.to_string(),
        product_id: context.link.product_id.clone(),
        creator_id: context.link.creator_id.clone(),
        store_owner_id: context.store_owner_id.clone(),
        sale_amount: split.sale_amount,
        commission_rate: split.commission_rate,
        commission_amount: split.commission_amount,
        platform_fee: split.platform_fee,
        creator_earnings: split.creator_earnings,
        store_owner_earnings: split.store_owner_earnings,
        sale_date: now,
        status: SaleStatus::Confirmed,
    })])
}

/// `products/create` and `products/update`: refresh catalog fields
pub fn plan_product_sync(
    product: &ShopifyProduct,
    shop_domain: &str,
    store_owner_id: Option<String>,
) -> Vec<IntendedWrite> {
    vec![IntendedWrite::ProductSync(ProductSync::from_shopify(
        product,
        shop_domain,
        store_owner_id,
    ))]
}
