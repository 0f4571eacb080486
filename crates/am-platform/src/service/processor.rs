//! Webhook Processor
//!
//! Runs one delivery end to end: verify, parse, look up, plan, apply.
//! Nothing is read from or written to the store until the signature has
//! been checked.

use std::future::Future;

use chrono::Utc;
use tracing::{debug, info, warn};

use am_common::{ShopifyOrder, ShopifyProduct};

use crate::config::WebhookConfig;
use crate::domain::{WebhookEnvelope, WebhookTopic};
use crate::error::{PlatformError, Result};
use crate::repository::{with_timeout, Repositories, StorageResult};
use crate::service::attribution::{self, AffiliateAttribution};
use crate::service::events::WebhookEvent;
use crate::service::planner::{self, IntendedWrite, RateSource, SaleContext};
use crate::service::signature;

/// Result of a processed delivery
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    pub topic: WebhookTopic,
    pub writes_applied: usize,
    pub affiliate_code: Option<String>,
}

pub struct WebhookProcessor {
    repos: Repositories,
    config: WebhookConfig,
}

impl WebhookProcessor {
    pub fn new(repos: Repositories, config: WebhookConfig) -> Self {
        Self { repos, config }
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    pub async fn process(&self, envelope: &WebhookEnvelope) -> Result<ProcessOutcome> {
        self.authenticate(envelope)?;

        let topic_header = envelope
            .topic
            .as_deref()
            .ok_or_else(|| PlatformError::validation("Missing X-Shopify-Topic header"))?;
        let topic = WebhookTopic::parse(topic_header);
        let shop_domain = envelope.shop_domain.as_str();

        info!(topic = %topic, shop_domain, bytes = envelope.raw_body.len(), "Webhook received");

        let event = WebhookEvent::parse(&topic, &envelope.raw_body, shop_domain)?;
        let (writes, attribution) = self.plan(&event, shop_domain).await?;
        let writes_applied = self.apply(writes).await?;

        Ok(ProcessOutcome {
            topic,
            writes_applied,
            affiliate_code: attribution.affiliate_code,
        })
    }

    fn authenticate(&self, envelope: &WebhookEnvelope) -> Result<()> {
        let secret = self.config.signing_secret()?;

        let Some(header) = envelope.signature_header.as_deref() else {
            warn!(shop_domain = %envelope.shop_domain, "Webhook without signature header");
            return Err(PlatformError::unauthorized("Missing webhook signature"));
        };

        if !signature::verify(secret, &envelope.raw_body, header) {
            warn!(
                shop_domain = %envelope.shop_domain,
                topic = envelope.topic.as_deref().unwrap_or(""),
                "Webhook signature mismatch"
            );
            return Err(PlatformError::unauthorized("Invalid webhook signature"));
        }
        Ok(())
    }

    async fn plan(
        &self,
        event: &WebhookEvent,
        shop_domain: &str,
    ) -> Result<(Vec<IntendedWrite>, AffiliateAttribution)> {
        match event {
            WebhookEvent::OrderCreated(order) | WebhookEvent::OrderUpdated(order) => {
                let attribution = self.attribute(order);
                if attribution.affiliate_code.is_none() {
                    return Ok((Vec::new(), attribution));
                }
                let store_owner_id = self.store_owner_id(shop_domain).await?;
                let writes = planner::plan_order(order, &attribution, shop_domain, store_owner_id, Utc::now());
                Ok((writes, attribution))
            }
            WebhookEvent::OrderPaid(order) => {
                let attribution = self.attribute(order);
                if attribution.code().is_some() && self.sale_recorded(&order.id).await? {
                    info!(order_id = %order.id, "Sale already recorded for order, skipping");
                    return Ok((Vec::new(), attribution));
                }
                let context = match attribution.code() {
                    Some(code) => self.sale_context(code, shop_domain).await?,
                    None => None,
                };
                let writes = planner::plan_sale(order, &attribution, shop_domain, context.as_ref(), Utc::now())?;
                Ok((writes, attribution))
            }
            WebhookEvent::ProductCreated(product) | WebhookEvent::ProductUpdated(product) => {
                let writes = self.plan_product(product, shop_domain).await?;
                Ok((writes, AffiliateAttribution::default()))
            }
            WebhookEvent::Unhandled(topic) => {
                info!(topic = %topic, shop_domain, "Ignoring unhandled webhook topic");
                Ok((Vec::new(), AffiliateAttribution::default()))
            }
        }
    }

    fn attribute(&self, order: &ShopifyOrder) -> AffiliateAttribution {
        let attribution = attribution::extract(order);
        match (attribution.code(), attribution.source) {
            (Some(code), Some(source)) => {
                info!(order_id = %order.id, affiliate_code = code, source = source.as_str(), "Order attributed");
            }
            _ => debug!(order_id = %order.id, "Order carries no affiliate code"),
        }
        attribution
    }

    async fn sale_context(&self, code: &str, shop_domain: &str) -> Result<Option<SaleContext>> {
        let Some(link) = self.bounded(self.repos.links.find_by_code(code)).await? else {
            warn!(affiliate_code = code, shop_domain, "Affiliate code matches no link, no sale recorded");
            return Ok(None);
        };

        let product = self.bounded(self.repos.products.find_by_id(&link.product_id)).await?;
        let (commission_rate, rate_source) =
            planner::resolve_rate(product.as_ref(), self.config.default_commission_rate);
        if rate_source == RateSource::Default {
            warn!(
                affiliate_code = code,
                product_id = %link.product_id,
                %commission_rate,
                "Product has no commission rate, using default"
            );
        }

        let store_owner_id = match product.and_then(|p| p.store_owner_id) {
            Some(owner) => Some(owner),
            None => self.store_owner_id(shop_domain).await?,
        };

        Ok(Some(SaleContext {
            link,
            commission_rate,
            store_owner_id,
        }))
    }

    async fn sale_recorded(&self, shopify_order_id: &str) -> Result<bool> {
        let sales = self.bounded(self.repos.sales.find_by_order(shopify_order_id)).await?;
        Ok(sales
            .iter()
            .any(|sale| sale.source_topic == WebhookTopic::OrderPaid.as_str()))
    }

    async fn plan_product(&self, product: &ShopifyProduct, shop_domain: &str) -> Result<Vec<IntendedWrite>> {
        let store_owner_id = self.store_owner_id(shop_domain).await?;
        Ok(planner::plan_product_sync(product, shop_domain, store_owner_id))
    }

    async fn store_owner_id(&self, shop_domain: &str) -> Result<Option<String>> {
        if shop_domain.is_empty() {
            return Ok(None);
        }
        let owner = self.bounded(self.repos.store_owners.find_by_shop_domain(shop_domain)).await?;
        Ok(owner.map(|o| o.id))
    }

    async fn apply(&self, writes: Vec<IntendedWrite>) -> Result<usize> {
        let count = writes.len();
        for write in writes {
            match write {
                IntendedWrite::Order(order) => {
                    self.bounded(self.repos.orders.upsert(&order)).await?;
                    info!(
                        shopify_order_id = %order.shopify_order_id,
                        affiliate_code = %order.affiliate_code,
                        status = %order.order_status,
                        "Affiliate order recorded"
                    );
                }
                IntendedWrite::Sale(sale) => {
                    let sale_id = self.bounded(self.repos.sales.create(&sale)).await?;
                    info!(
                        sale_id = %sale_id,
                        shopify_order_id = %sale.shopify_order_id,
                        affiliate_code = %sale.affiliate_code,
                        commission = %sale.commission_amount,
                        creator_earnings = %sale.creator_earnings,
                        "Affiliate sale recorded"
                    );
                }
                IntendedWrite::ProductSync(sync) => {
                    let product_id = self.bounded(self.repos.products.upsert_from_shopify(&sync)).await?;
                    info!(
                        product_id = %product_id,
                        shopify_product_id = %sync.shopify_product_id,
                        "Product synced"
                    );
                }
            }
        }
        Ok(count)
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        Ok(with_timeout(self.config.store_timeout, call).await?)
    }
}
