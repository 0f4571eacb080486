//! In-memory record store
//!
//! Implements every repository port over mutex-guarded maps. Used by the
//! server's `memory` store mode and by tests as the fake collaborator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{AffiliateLink, OrderRecord, Product, ProductSync, SaleId, SaleRecord, StoreOwner};
use crate::repository::{
    AffiliateLinkRepository, OrderRepository, ProductRepository, SaleRepository, StorageError,
    StorageResult, StoreOwnerRepository,
};

#[derive(Default)]
pub struct InMemoryStore {
    sales: Mutex<Vec<SaleRecord>>,
    orders: Mutex<HashMap<String, OrderRecord>>,
    products: Mutex<HashMap<String, Product>>,
    links: Mutex<HashMap<String, AffiliateLink>>,
    store_owners: Mutex<HashMap<String, StoreOwner>>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_link(&self, link: AffiliateLink) {
        self.links.lock().insert(link.id.clone(), link);
    }

    pub fn insert_product(&self, product: Product) {
        self.products.lock().insert(product.id.clone(), product);
    }

    pub fn insert_store_owner(&self, owner: StoreOwner) {
        self.store_owners.lock().insert(owner.shop_domain.clone(), owner);
    }

    pub fn sales(&self) -> Vec<SaleRecord> {
        self.sales.lock().clone()
    }

    pub fn orders(&self) -> Vec<OrderRecord> {
        self.orders.lock().values().cloned().collect()
    }

    pub fn products(&self) -> Vec<Product> {
        self.products.lock().values().cloned().collect()
    }

    pub fn link_by_code(&self, affiliate_code: &str) -> Option<AffiliateLink> {
        self.links
            .lock()
            .values()
            .find(|l| l.affiliate_code == affiliate_code)
            .cloned()
    }

    /// Simulate an unreachable store: every call fails until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("in-memory store marked unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SaleRepository for InMemoryStore {
    async fn create(&self, sale: &SaleRecord) -> StorageResult<SaleId> {
        self.check_available()?;
        let mut sales = self.sales.lock();
        if let Some(existing) = sales.iter().find(|s| s.dedup_key() == sale.dedup_key()) {
            return Ok(existing.id.clone());
        }
        sales.push(sale.clone());
        Ok(sale.id.clone())
    }

    async fn find_by_order(&self, shopify_order_id: &str) -> StorageResult<Vec<SaleRecord>> {
        self.check_available()?;
        Ok(self
            .sales
            .lock()
            .iter()
            .filter(|s| s.shopify_order_id == shopify_order_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn upsert(&self, order: &OrderRecord) -> StorageResult<()> {
        self.check_available()?;
        let mut orders = self.orders.lock();
        match orders.get_mut(&order.shopify_order_id) {
            // Absent optional fields keep their stored value, as `$set` does.
            Some(existing) => {
                let store_owner_id = order.store_owner_id.clone().or(existing.store_owner_id.take());
                let processed_at = order.processed_at.or(existing.processed_at);
                *existing = OrderRecord {
                    id: existing.id.clone(),
                    received_at: existing.received_at,
                    store_owner_id,
                    processed_at,
                    ..order.clone()
                };
            }
            None => {
                orders.insert(order.shopify_order_id.clone(), order.clone());
            }
        }
        Ok(())
    }

    async fn find_by_shopify_id(&self, shopify_order_id: &str) -> StorageResult<Option<OrderRecord>> {
        self.check_available()?;
        Ok(self.orders.lock().get(shopify_order_id).cloned())
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<Product>> {
        self.check_available()?;
        Ok(self.products.lock().get(id).cloned())
    }

    async fn find_by_shopify_id(&self, shopify_product_id: &str) -> StorageResult<Option<Product>> {
        self.check_available()?;
        Ok(self
            .products
            .lock()
            .values()
            .find(|p| p.shopify_product_id.as_deref() == Some(shopify_product_id))
            .cloned())
    }

    async fn upsert_from_shopify(&self, sync: &ProductSync) -> StorageResult<String> {
        self.check_available()?;
        let mut products = self.products.lock();
        let existing = products
            .values_mut()
            .find(|p| p.shopify_product_id.as_deref() == Some(sync.shopify_product_id.as_str()));

        match existing {
            Some(product) => {
                product.apply_sync(sync);
                Ok(product.id.clone())
            }
            None => {
                let product = Product::from_sync(sync);
                let id = product.id.clone();
                products.insert(id.clone(), product);
                Ok(id)
            }
        }
    }
}

#[async_trait]
impl AffiliateLinkRepository for InMemoryStore {
    async fn find_by_code(&self, affiliate_code: &str) -> StorageResult<Option<AffiliateLink>> {
        self.check_available()?;
        Ok(self.link_by_code(affiliate_code))
    }

    async fn increment_clicks(&self, id: &str) -> StorageResult<()> {
        self.check_available()?;
        if let Some(link) = self.links.lock().get_mut(id) {
            link.clicks += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl StoreOwnerRepository for InMemoryStore {
    async fn find_by_shop_domain(&self, shop_domain: &str) -> StorageResult<Option<StoreOwner>> {
        self.check_available()?;
        Ok(self.store_owners.lock().get(shop_domain).cloned())
    }
}
