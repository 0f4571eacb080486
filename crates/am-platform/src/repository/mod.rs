//! Repository Layer
//!
//! Persistence ports for the marketplace records. The webhook path only
//! talks to these traits; adapters exist for MongoDB and for an in-memory
//! store used in development and tests.

pub mod mongo;
pub mod memory;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{AffiliateLink, OrderRecord, Product, ProductSync, SaleId, SaleRecord, StoreOwner};

pub use memory::InMemoryStore;
pub use mongo::{
    ensure_indexes, MongoAffiliateLinkRepository, MongoOrderRepository, MongoProductRepository,
    MongoSaleRepository, MongoStoreOwnerRepository,
};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Sales ledger. `create` is idempotent on `(shopify_order_id, source_topic)`:
/// replaying a webhook returns the id of the sale already recorded.
#[async_trait]
pub trait SaleRepository: Send + Sync {
    async fn create(&self, sale: &SaleRecord) -> StorageResult<SaleId>;
    async fn find_by_order(&self, shopify_order_id: &str) -> StorageResult<Vec<SaleRecord>>;
}

/// Attributed orders, one record per platform order id
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn upsert(&self, order: &OrderRecord) -> StorageResult<()>;
    async fn find_by_shopify_id(&self, shopify_order_id: &str) -> StorageResult<Option<OrderRecord>>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<Product>>;
    async fn find_by_shopify_id(&self, shopify_product_id: &str) -> StorageResult<Option<Product>>;
    /// Insert or refresh catalog fields; returns the marketplace product id
    async fn upsert_from_shopify(&self, sync: &ProductSync) -> StorageResult<String>;
}

#[async_trait]
pub trait AffiliateLinkRepository: Send + Sync {
    async fn find_by_code(&self, affiliate_code: &str) -> StorageResult<Option<AffiliateLink>>;
    async fn increment_clicks(&self, id: &str) -> StorageResult<()>;
}

#[async_trait]
pub trait StoreOwnerRepository: Send + Sync {
    async fn find_by_shop_domain(&self, shop_domain: &str) -> StorageResult<Option<StoreOwner>>;
}

/// The set of ports the webhook and redirect paths depend on
#[derive(Clone)]
pub struct Repositories {
    pub sales: Arc<dyn SaleRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub links: Arc<dyn AffiliateLinkRepository>,
    pub store_owners: Arc<dyn StoreOwnerRepository>,
}

impl Repositories {
    /// Every port backed by the same in-memory store
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            sales: store.clone(),
            orders: store.clone(),
            products: store.clone(),
            links: store.clone(),
            store_owners: store,
        }
    }

    pub fn mongo(db: &mongodb::Database) -> Self {
        Self {
            sales: Arc::new(MongoSaleRepository::new(db)),
            orders: Arc::new(MongoOrderRepository::new(db)),
            products: Arc::new(MongoProductRepository::new(db)),
            links: Arc::new(MongoAffiliateLinkRepository::new(db)),
            store_owners: Arc::new(MongoStoreOwnerRepository::new(db)),
        }
    }
}

/// Bound a store call by `limit`, folding expiry into `StorageError::Timeout`.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> StorageResult<T>
where
    F: Future<Output = StorageResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let result = with_timeout(Duration::from_secs(1), async { Ok::<_, StorageError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, StorageError>(())
        })
        .await;

        assert!(matches!(result, Err(StorageError::Timeout(_))));
    }
}
