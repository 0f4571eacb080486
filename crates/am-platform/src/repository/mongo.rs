//! MongoDB repositories
//!
//! Collection names follow the dashboard's tables: `sales`, `orders`,
//! `products`, `affiliate_links`, `store_owners`.

use async_trait::async_trait;
use mongodb::{
    bson::{doc, to_document, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use futures::TryStreamExt;
use tracing::{debug, info};

use crate::domain::{AffiliateLink, OrderRecord, Product, ProductSync, SaleId, SaleRecord, StoreOwner};
use crate::repository::{
    AffiliateLinkRepository, OrderRepository, ProductRepository, SaleRepository, StorageError,
    StorageResult, StoreOwnerRepository,
};

const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Create the indexes the webhook path relies on. The unique sales index is
/// what makes re-delivered `orders/paid` webhooks safe.
pub async fn ensure_indexes(db: &Database) -> StorageResult<()> {
    let unique = || IndexOptions::builder().unique(true).build();

    db.collection::<SaleRecord>("sales")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "shopify_order_id": 1, "source_topic": 1 })
                .options(unique())
                .build(),
            None,
        )
        .await?;

    db.collection::<OrderRecord>("orders")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "shopify_order_id": 1 })
                .options(unique())
                .build(),
            None,
        )
        .await?;

    db.collection::<AffiliateLink>("affiliate_links")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "affiliate_code": 1 })
                .options(unique())
                .build(),
            None,
        )
        .await?;

    db.collection::<Product>("products")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "shopify_product_id": 1 })
                .options(IndexOptions::builder().unique(true).sparse(true).build())
                .build(),
            None,
        )
        .await?;

    db.collection::<StoreOwner>("store_owners")
        .create_index(
            IndexModel::builder().keys(doc! { "shop_domain": 1 }).build(),
            None,
        )
        .await?;

    info!("MongoDB indexes ensured");
    Ok(())
}

pub struct MongoSaleRepository {
    collection: Collection<SaleRecord>,
}

impl MongoSaleRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("sales"),
        }
    }
}

#[async_trait]
impl SaleRepository for MongoSaleRepository {
    async fn create(&self, sale: &SaleRecord) -> StorageResult<SaleId> {
        match self.collection.insert_one(sale, None).await {
            Ok(_) => Ok(sale.id.clone()),
            Err(e) if is_duplicate_key(&e) => {
                debug!(
                    shopify_order_id = %sale.shopify_order_id,
                    topic = %sale.source_topic,
                    "Sale already recorded"
                );
                let existing = self
                    .collection
                    .find_one(
                        doc! {
                            "shopify_order_id": &sale.shopify_order_id,
                            "source_topic": &sale.source_topic,
                        },
                        None,
                    )
                    .await?;
                Ok(existing.map(|s| s.id).unwrap_or_else(|| sale.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_order(&self, shopify_order_id: &str) -> StorageResult<Vec<SaleRecord>> {
        let cursor = self
            .collection
            .find(doc! { "shopify_order_id": shopify_order_id }, None)
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

pub struct MongoOrderRepository {
    collection: Collection<OrderRecord>,
}

impl MongoOrderRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("orders"),
        }
    }
}

#[async_trait]
impl OrderRepository for MongoOrderRepository {
    async fn upsert(&self, order: &OrderRecord) -> StorageResult<()> {
        // Identity and first-seen time are fixed by the first delivery.
        let mut fields = to_document(order)?;
        fields.remove("_id");
        fields.remove("received_at");

        let update = doc! {
            "$set": fields,
            "$setOnInsert": {
                "_id": &order.id,
                "received_at": bson::DateTime::from_chrono(order.received_at),
            },
        };
        let options = mongodb::options::UpdateOptions::builder().upsert(true).build();

        self.collection
            .update_one(doc! { "shopify_order_id": &order.shopify_order_id }, update, options)
            .await?;
        Ok(())
    }

    async fn find_by_shopify_id(&self, shopify_order_id: &str) -> StorageResult<Option<OrderRecord>> {
        Ok(self
            .collection
            .find_one(doc! { "shopify_order_id": shopify_order_id }, None)
            .await?)
    }
}

pub struct MongoProductRepository {
    collection: Collection<Product>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("products"),
        }
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<Product>> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_by_shopify_id(&self, shopify_product_id: &str) -> StorageResult<Option<Product>> {
        Ok(self
            .collection
            .find_one(doc! { "shopify_product_id": shopify_product_id }, None)
            .await?)
    }

    async fn upsert_from_shopify(&self, sync: &ProductSync) -> StorageResult<String> {
        let filter = doc! { "shopify_product_id": &sync.shopify_product_id };
        let update = product_sync_update(sync)?;
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        // Two racing upserts can both insert; the unique index rejects one and
        // the retry lands on the winner's document.
        let product = match self
            .collection
            .find_one_and_update(filter.clone(), update.clone(), options.clone())
            .await
        {
            Err(e) if is_duplicate_key(&e) => {
                debug!(shopify_product_id = %sync.shopify_product_id, "Concurrent product insert, retrying as update");
                self.collection.find_one_and_update(filter, update, options).await?
            }
            result => result?,
        };

        if let Some(owner_id) = &sync.store_owner_id {
            self.collection
                .update_one(
                    doc! {
                        "shopify_product_id": &sync.shopify_product_id,
                        "store_owner_id": { "$exists": false },
                    },
                    doc! { "$set": { "store_owner_id": owner_id } },
                    None,
                )
                .await?;
        }

        product.map(|p| p.id).ok_or_else(|| {
            StorageError::Unavailable(format!(
                "upsert returned no product for {}",
                sync.shopify_product_id
            ))
        })
    }
}

/// Catalog fields go to `$set`; identity and creation time are only written
/// on insert. `commission_rate` and `store_owner_id` are never part of it.
fn product_sync_update(sync: &ProductSync) -> StorageResult<Document> {
    let mut fields = to_document(&Product::from_sync(sync))?;
    fields.remove("commission_rate");
    fields.remove("store_owner_id");

    let mut on_insert = Document::new();
    for key in ["_id", "created_at"] {
        if let Some(value) = fields.remove(key) {
            on_insert.insert(key, value);
        }
    }

    Ok(doc! {
        "$set": fields,
        "$setOnInsert": on_insert,
    })
}

pub struct MongoAffiliateLinkRepository {
    collection: Collection<AffiliateLink>,
}

impl MongoAffiliateLinkRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("affiliate_links"),
        }
    }
}

#[async_trait]
impl AffiliateLinkRepository for MongoAffiliateLinkRepository {
    async fn find_by_code(&self, affiliate_code: &str) -> StorageResult<Option<AffiliateLink>> {
        Ok(self
            .collection
            .find_one(doc! { "affiliate_code": affiliate_code }, None)
            .await?)
    }

    async fn increment_clicks(&self, id: &str) -> StorageResult<()> {
        self.collection
            .update_one(doc! { "_id": id }, doc! { "$inc": { "clicks": 1_i64 } }, None)
            .await?;
        Ok(())
    }
}

pub struct MongoStoreOwnerRepository {
    collection: Collection<StoreOwner>,
}

impl MongoStoreOwnerRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("store_owners"),
        }
    }
}

#[async_trait]
impl StoreOwnerRepository for MongoStoreOwnerRepository {
    async fn find_by_shop_domain(&self, shop_domain: &str) -> StorageResult<Option<StoreOwner>> {
        Ok(self
            .collection
            .find_one(doc! { "shop_domain": shop_domain }, None)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_product_sync_update_never_sets_rate_or_owner() {
        let sync = ProductSync {
            shopify_product_id: "555".to_string(),
            shop_domain: "demo.myshopify.com".to_string(),
            title: "Mug".to_string(),
            description: None,
            price: dec!(12.00),
            product_url: "https://demo.myshopify.com/products/mug".to_string(),
            image_url: None,
            is_active: true,
            store_owner_id: Some("owner-1".to_string()),
        };

        let update = product_sync_update(&sync).unwrap();
        let set = update.get_document("$set").unwrap();
        let on_insert = update.get_document("$setOnInsert").unwrap();

        assert_eq!(set.get_str("title").unwrap(), "Mug");
        assert_eq!(set.get_str("shopify_product_id").unwrap(), "555");
        assert!(set.get_datetime("updated_at").is_ok());
        for key in ["_id", "created_at", "commission_rate", "store_owner_id"] {
            assert!(!set.contains_key(key), "$set must not carry {}", key);
        }

        assert!(on_insert.get_str("_id").is_ok());
        assert!(on_insert.get_datetime("created_at").is_ok());
        assert!(!on_insert.contains_key("commission_rate"));
    }

    #[test]
    fn test_order_document_shape() {
        let order = OrderRecord {
            id: "order-1".to_string(),
            shopify_order_id: "1001".to_string(),
            shop_domain: "demo.myshopify.com".to_string(),
            affiliate_code: "CREATOR1".to_string(),
            total_price: dec!(100.00),
            order_status: "paid".to_string(),
            store_owner_id: None,
            processed_at: Some(Utc::now()),
            received_at: Utc::now(),
        };

        let document = to_document(&order).unwrap();
        assert_eq!(document.get_str("_id").unwrap(), "order-1");
        assert_eq!(document.get_str("total_price").unwrap(), "100.00");
        assert!(document.get_datetime("received_at").is_ok());
        assert!(!document.contains_key("store_owner_id"));
    }
}
