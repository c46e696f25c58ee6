//! # Marketplace Flows
//!
//! Operations that validate input, touch more than one document, or turn an
//! empty lookup into `NotFound`. Handlers call these instead of the store
//! whenever any of that applies.
//!
//! ## Two-document writes
//!
//! Listing creation, order placement and payment recording each issue two
//! writes with no shared transaction. The first write is undone (deleted) if
//! the second one fails or matches nothing, so once a call returns either
//! both effects are visible or neither is. A concurrent reader can still
//! observe the first document alone while the call is in flight.

use crate::error::{MarketError, MarketResult};
use crate::order::{dedup_by_buyer, Order, Payment};
use crate::product::{Product, ProductFilter, ProductPatch};
use crate::store::SharedStore;
use crate::user::User;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct Marketplace {
    store: SharedStore,
    last_stamp: Arc<AtomicI64>,
}

impl Marketplace {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            last_stamp: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Direct access for single-call reads
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Epoch milliseconds, strictly increasing within this process so that
    /// listings created in the same millisecond still sort deterministically.
    fn next_timestamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let prev = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        now.max(prev + 1)
    }

    // --- lookups ----------------------------------------------------------

    pub async fn product(&self, id: &str) -> MarketResult<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| MarketError::not_found("product", id))
    }

    pub async fn order(&self, id: &str) -> MarketResult<Order> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| MarketError::not_found("order", id))
    }

    pub async fn user_by_email(&self, email: &str) -> MarketResult<User> {
        self.store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| MarketError::not_found("user", email))
    }

    /// Products in a category, newest first. `raw_id` must be a decimal integer.
    pub async fn products_in_category(&self, raw_id: &str) -> MarketResult<Vec<Product>> {
        let category_id: i64 = raw_id.trim().parse().map_err(|_| {
            MarketError::validation(format!("category id must be an integer, got {:?}", raw_id))
        })?;
        self.store
            .find_products(&ProductFilter::in_category(category_id))
            .await
    }

    /// Orders for a seller's listings, one per buyer email (first wins)
    pub async fn buyers_of(&self, seller_email: &str) -> MarketResult<Vec<Order>> {
        let orders = self.store.find_orders_by_seller(seller_email).await?;
        Ok(dedup_by_buyer(orders))
    }

    // --- single-document updates -------------------------------------------

    pub async fn advertise_product(&self, id: &str) -> MarketResult<()> {
        self.patch_product(id, &ProductPatch::advertise()).await
    }

    pub async fn report_product(&self, id: &str) -> MarketResult<()> {
        self.patch_product(id, &ProductPatch::report()).await
    }

    async fn patch_product(&self, id: &str, patch: &ProductPatch) -> MarketResult<()> {
        if self.store.update_product(id, patch).await? {
            info!(product_id = %id, ?patch, "product updated");
            Ok(())
        } else {
            Err(MarketError::not_found("product", id))
        }
    }

    pub async fn delete_product(&self, id: &str) -> MarketResult<()> {
        if self.store.delete_product(id).await? {
            info!(product_id = %id, "product deleted");
            Ok(())
        } else {
            Err(MarketError::not_found("product", id))
        }
    }

    /// Sign up a Buyer or Seller. Admin accounts are provisioned directly in
    /// the database, and verification is granted only by an admin.
    pub async fn register_user(&self, mut user: User) -> MarketResult<User> {
        user.validate()?;
        if user.is_admin() {
            return Err(MarketError::validation("Admin accounts cannot be self-registered"));
        }
        user.id = None;
        user.is_user_verified = false;
        let id = self.store.insert_user(&user).await?;
        info!(user_id = %id, email = %user.email, role = user.user_role.as_str(), "user registered");
        user.id = Some(id);
        Ok(user)
    }

    pub async fn verify_user(&self, id: &str) -> MarketResult<()> {
        if self.store.set_user_verified(id).await? {
            info!(user_id = %id, "user verified");
            Ok(())
        } else {
            Err(MarketError::not_found("user", id))
        }
    }

    pub async fn delete_user(&self, id: &str) -> MarketResult<()> {
        if self.store.delete_user(id).await? {
            info!(user_id = %id, "user deleted");
            Ok(())
        } else {
            Err(MarketError::not_found("user", id))
        }
    }

    // --- two-document flows -------------------------------------------------

    /// Insert a listing, then stamp it with the creation time and an
    /// `available` status regardless of what the caller sent.
    pub async fn add_product(&self, mut product: Product) -> MarketResult<Product> {
        product.validate()?;
        product.id = None;
        product.is_advertised = false;
        product.is_reported = false;

        let id = self.store.insert_product(&product).await?;
        let patch = ProductPatch::stamp(self.next_timestamp());

        match self.store.update_product(&id, &patch).await {
            Ok(true) => {
                patch.apply(&mut product);
                product.id = Some(id);
                info!(
                    product_id = ?product.id,
                    category_id = product.category_id,
                    owner = %product.owner_email,
                    "product listed"
                );
                Ok(product)
            }
            Ok(false) => {
                self.undo_product(&id).await;
                Err(MarketError::Conflict(format!(
                    "product {} was removed before it could be stamped",
                    id
                )))
            }
            Err(e) => {
                self.undo_product(&id).await;
                Err(e)
            }
        }
    }

    /// Insert an order, then mark the referenced listing sold and unadvertised.
    ///
    /// The listing must exist, be available, and belong to `sellersEmail`.
    pub async fn place_order(&self, mut order: Order) -> MarketResult<Order> {
        order.validate()?;

        let product = self.product(&order.product_id).await?;
        if !product.is_available() {
            return Err(MarketError::Conflict(format!(
                "product {} is already sold",
                order.product_id
            )));
        }
        if product.owner_email != order.sellers_email {
            return Err(MarketError::validation(format!(
                "sellersEmail does not match the owner of product {}",
                order.product_id
            )));
        }
        if order.email == product.owner_email {
            return Err(MarketError::validation("sellers cannot order their own listing"));
        }

        order.id = None;
        order.paid = false;
        order.transaction_id = None;
        order.price.get_or_insert(product.price);

        let id = self.store.insert_order(&order).await?;

        match self
            .store
            .update_product(&order.product_id, &ProductPatch::sell())
            .await
        {
            Ok(true) => {
                info!(order_id = %id, product_id = %order.product_id, buyer = %order.email, "order placed");
                order.id = Some(id);
                Ok(order)
            }
            Ok(false) => {
                self.undo_order(&id).await;
                Err(MarketError::Conflict(format!(
                    "product {} was sold to another buyer",
                    order.product_id
                )))
            }
            Err(e) => {
                self.undo_order(&id).await;
                Err(e)
            }
        }
    }

    /// Insert a payment, then mark the referenced order paid with the
    /// payment's transaction id.
    pub async fn record_payment(&self, mut payment: Payment) -> MarketResult<Payment> {
        payment.validate()?;

        let order = self.order(&payment.order_id).await?;
        if order.paid {
            return Err(MarketError::Conflict(format!(
                "order {} is already paid",
                payment.order_id
            )));
        }

        payment.id = None;
        let id = self.store.insert_payment(&payment).await?;

        match self
            .store
            .mark_order_paid(&payment.order_id, &payment.transaction_id)
            .await
        {
            Ok(true) => {
                info!(
                    payment_id = %id,
                    order_id = %payment.order_id,
                    transaction_id = %payment.transaction_id,
                    "payment recorded"
                );
                payment.id = Some(id);
                Ok(payment)
            }
            Ok(false) => {
                self.undo_payment(&id).await;
                Err(MarketError::Conflict(format!(
                    "order {} was paid or removed concurrently",
                    payment.order_id
                )))
            }
            Err(e) => {
                self.undo_payment(&id).await;
                Err(e)
            }
        }
    }

    async fn undo_product(&self, id: &str) {
        warn!(product_id = %id, "rolling back product insert");
        if let Err(e) = self.store.delete_product(id).await {
            error!(product_id = %id, "rollback failed: {}", e);
        }
    }

    async fn undo_order(&self, id: &str) {
        warn!(order_id = %id, "rolling back order insert");
        if let Err(e) = self.store.delete_order(id).await {
            error!(order_id = %id, "rollback failed: {}", e);
        }
    }

    async fn undo_payment(&self, id: &str) {
        warn!(payment_id = %id, "rolling back payment insert");
        if let Err(e) = self.store.delete_payment(id).await {
            error!(payment_id = %id, "rollback failed: {}", e);
        }
    }
}
