//! # MongoDB Store
//!
//! `MarketStore` over five collections in one database. Each trait method is
//! exactly one driver call.

use crate::convert::{from_document, inserted_id, object_id, to_document};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use market_core::{
    Category, MarketError, MarketResult, MarketStore, Order, Payment, Product, ProductFilter,
    ProductPatch, User, UserRole,
};
use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Collection, Cursor, Database};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

pub const CATEGORIES: &str = "categories";
pub const PRODUCTS: &str = "products";
pub const USERS: &str = "users";
pub const ORDERS: &str = "orders";
pub const PAYMENTS: &str = "payments";

pub struct MongoStore {
    db: Database,
    categories: Collection<Document>,
    products: Collection<Document>,
    users: Collection<Document>,
    orders: Collection<Document>,
    payments: Collection<Document>,
}

fn storage_err(e: mongodb::error::Error) -> MarketError {
    MarketError::Storage(e.to_string())
}

/// Drain a cursor. Documents that do not decode are logged and left out.
async fn collect<T: DeserializeOwned>(
    collection: &str,
    mut cursor: Cursor<Document>,
) -> MarketResult<Vec<T>> {
    let mut items = Vec::new();
    while let Some(doc) = cursor.try_next().await.map_err(storage_err)? {
        items.extend(decode_or_skip(collection, doc));
    }
    Ok(items)
}

fn decode_or_skip<T: DeserializeOwned>(collection: &str, doc: Document) -> Option<T> {
    let id = doc.get("_id").cloned();
    match from_document(doc) {
        Ok(item) => Some(item),
        Err(e) => {
            warn!(collection, id = ?id, "skipping undecodable document: {}", e);
            None
        }
    }
}

/// Query document for a product filter
pub fn product_query(filter: &ProductFilter) -> Document {
    let mut query = Document::new();
    if let Some(category_id) = filter.category_id {
        query.insert("categoryId", category_id);
    }
    if let Some(email) = &filter.owner_email {
        query.insert("ownerEmail", email.as_str());
    }
    if let Some(status) = filter.status {
        query.insert("status", status.as_str());
    }
    if let Some(advertised) = filter.advertised {
        query.insert("isAdvertised", advertised);
    }
    if let Some(reported) = filter.reported {
        query.insert("isReported", reported);
    }
    query
}

/// `$set` document for a product patch
pub fn product_update(patch: &ProductPatch) -> Document {
    let mut set = Document::new();
    if let Some(status) = patch.status {
        set.insert("status", status.as_str());
    }
    if let Some(advertised) = patch.is_advertised {
        set.insert("isAdvertised", advertised);
    }
    if let Some(reported) = patch.is_reported {
        set.insert("isReported", reported);
    }
    if let Some(ts) = patch.timestamp {
        set.insert("timestamp", ts);
    }
    doc! { "$set": set }
}

impl MongoStore {
    /// Wrap an existing client
    pub fn new(client: &Client, database: &str) -> Self {
        let db = client.database(database);
        Self {
            categories: db.collection(CATEGORIES),
            products: db.collection(PRODUCTS),
            users: db.collection(USERS),
            orders: db.collection(ORDERS),
            payments: db.collection(PAYMENTS),
            db,
        }
    }

    /// Connect once at startup; the handle is shared through `AppState`
    pub async fn connect(uri: &str, database: &str) -> MarketResult<Self> {
        let mut options = ClientOptions::parse(uri).await.map_err(|e| {
            MarketError::Configuration(format!("invalid MONGODB_URI: {}", e))
        })?;
        options.app_name = Some("resale-market".to_string());
        let client = Client::with_options(options).map_err(storage_err)?;
        info!("MongoDB client ready for database {}", database);
        Ok(Self::new(&client, database))
    }

    async fn update_by_id(
        &self,
        collection: &Collection<Document>,
        id: &str,
        guard: Document,
        update: Document,
    ) -> MarketResult<bool> {
        let Some(oid) = object_id(id) else {
            return Ok(false);
        };
        let mut query = doc! { "_id": oid };
        for (key, value) in guard {
            query.insert(key, value);
        }
        let result = collection
            .update_one(query, update, None)
            .await
            .map_err(storage_err)?;
        Ok(result.matched_count > 0)
    }

    async fn delete_by_id(&self, collection: &Collection<Document>, id: &str) -> MarketResult<bool> {
        let Some(oid) = object_id(id) else {
            return Ok(false);
        };
        let result = collection
            .delete_one(doc! { "_id": oid }, None)
            .await
            .map_err(storage_err)?;
        Ok(result.deleted_count > 0)
    }

    async fn find_by_id<T: DeserializeOwned>(
        &self,
        collection: &Collection<Document>,
        id: &str,
    ) -> MarketResult<Option<T>> {
        let Some(oid) = object_id(id) else {
            return Ok(None);
        };
        collection
            .find_one(doc! { "_id": oid }, None)
            .await
            .map_err(storage_err)?
            .map(from_document)
            .transpose()
    }
}

#[async_trait]
impl MarketStore for MongoStore {
    fn backend_name(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> MarketResult<()> {
        self.db
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    async fn list_categories(&self) -> MarketResult<Vec<Category>> {
        let cursor = self.categories.find(None, None).await.map_err(storage_err)?;
        collect(CATEGORIES, cursor).await
    }

    #[instrument(skip(self))]
    async fn find_products(&self, filter: &ProductFilter) -> MarketResult<Vec<Product>> {
        let query = product_query(filter);
        let options = filter
            .newest_first
            .then(|| FindOptions::builder().sort(doc! { "timestamp": -1 }).build());
        debug!(?query, "finding products");
        let cursor = self
            .products
            .find(query, options)
            .await
            .map_err(storage_err)?;
        collect(PRODUCTS, cursor).await
    }

    async fn get_product(&self, id: &str) -> MarketResult<Option<Product>> {
        self.find_by_id(&self.products, id).await
    }

    async fn insert_product(&self, product: &Product) -> MarketResult<String> {
        let result = self
            .products
            .insert_one(to_document(product)?, None)
            .await
            .map_err(storage_err)?;
        Ok(inserted_id(result))
    }

    async fn update_product(&self, id: &str, patch: &ProductPatch) -> MarketResult<bool> {
        let guard = match patch.only_if_status {
            Some(status) => doc! { "status": status.as_str() },
            None => Document::new(),
        };
        self.update_by_id(&self.products, id, guard, product_update(patch))
            .await
    }

    async fn delete_product(&self, id: &str) -> MarketResult<bool> {
        self.delete_by_id(&self.products, id).await
    }

    async fn insert_user(&self, user: &User) -> MarketResult<String> {
        let result = self
            .users
            .insert_one(to_document(user)?, None)
            .await
            .map_err(storage_err)?;
        Ok(inserted_id(result))
    }

    async fn find_user_by_email(&self, email: &str) -> MarketResult<Option<User>> {
        self.users
            .find_one(doc! { "email": email }, None)
            .await
            .map_err(storage_err)?
            .map(from_document)
            .transpose()
    }

    async fn find_users_by_role(&self, role: UserRole) -> MarketResult<Vec<User>> {
        let options = FindOptions::builder().sort(doc! { "email": 1 }).build();
        let cursor = self
            .users
            .find(doc! { "userRole": role.as_str() }, options)
            .await
            .map_err(storage_err)?;
        collect(USERS, cursor).await
    }

    async fn set_user_verified(&self, id: &str) -> MarketResult<bool> {
        self.update_by_id(
            &self.users,
            id,
            Document::new(),
            doc! { "$set": { "isUserVerified": true } },
        )
        .await
    }

    async fn delete_user(&self, id: &str) -> MarketResult<bool> {
        self.delete_by_id(&self.users, id).await
    }

    async fn insert_order(&self, order: &Order) -> MarketResult<String> {
        let result = self
            .orders
            .insert_one(to_document(order)?, None)
            .await
            .map_err(storage_err)?;
        Ok(inserted_id(result))
    }

    async fn get_order(&self, id: &str) -> MarketResult<Option<Order>> {
        self.find_by_id(&self.orders, id).await
    }

    async fn find_orders_by_buyer(&self, email: &str) -> MarketResult<Vec<Order>> {
        let cursor = self
            .orders
            .find(doc! { "email": email }, None)
            .await
            .map_err(storage_err)?;
        collect(ORDERS, cursor).await
    }

    async fn find_orders_by_seller(&self, email: &str) -> MarketResult<Vec<Order>> {
        let cursor = self
            .orders
            .find(doc! { "sellersEmail": email }, None)
            .await
            .map_err(storage_err)?;
        collect(ORDERS, cursor).await
    }

    async fn mark_order_paid(&self, id: &str, transaction_id: &str) -> MarketResult<bool> {
        self.update_by_id(
            &self.orders,
            id,
            doc! { "paid": { "$ne": true } },
            doc! { "$set": { "paid": true, "transactionId": transaction_id } },
        )
        .await
    }

    async fn delete_order(&self, id: &str) -> MarketResult<bool> {
        self.delete_by_id(&self.orders, id).await
    }

    async fn insert_payment(&self, payment: &Payment) -> MarketResult<String> {
        let result = self
            .payments
            .insert_one(to_document(payment)?, None)
            .await
            .map_err(storage_err)?;
        Ok(inserted_id(result))
    }

    async fn delete_payment(&self, id: &str) -> MarketResult<bool> {
        self.delete_by_id(&self.payments, id).await
    }
}
