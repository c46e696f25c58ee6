//! # Document Store Trait
//!
//! The storage seam for the marketplace. Each method maps to a single
//! find / find-one / insert-one / update-one / delete-one call on one of
//! the five collections; nothing here spans two documents.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              MarketStore (trait)             │
//! │  categories · products · users · orders ·    │
//! │  payments                                    │
//! └──────────────────────────────────────────────┘
//!                       ▲
//!          ┌────────────┴────────────┐
//!  ┌───────┴───────┐         ┌───────┴───────┐
//!  │  MongoStore   │         │  MemoryStore  │
//!  │ (market-mongo)│         │ (dev / tests) │
//!  └───────────────┘         └───────────────┘
//! ```
//!
//! Update methods return `false` when no document matched; they never
//! insert. Identifiers the backend cannot parse behave like absent ones.

use crate::category::Category;
use crate::error::MarketResult;
use crate::order::{Order, Payment};
use crate::product::{Product, ProductFilter, ProductPatch};
use crate::user::{User, UserRole};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Backend name (for logging and the health endpoint)
    fn backend_name(&self) -> &'static str;

    /// Liveness check
    async fn ping(&self) -> MarketResult<()> {
        Ok(())
    }

    // --- categories -------------------------------------------------------

    /// All categories in storage-native order
    async fn list_categories(&self) -> MarketResult<Vec<Category>>;

    // --- products ---------------------------------------------------------

    async fn find_products(&self, filter: &ProductFilter) -> MarketResult<Vec<Product>>;

    async fn get_product(&self, id: &str) -> MarketResult<Option<Product>>;

    /// Insert and return the assigned identifier
    async fn insert_product(&self, product: &Product) -> MarketResult<String>;

    /// Apply `patch` to an existing product. `false` if nothing matched
    /// (including when the patch's status guard rejected it).
    async fn update_product(&self, id: &str, patch: &ProductPatch) -> MarketResult<bool>;

    async fn delete_product(&self, id: &str) -> MarketResult<bool>;

    // --- users ------------------------------------------------------------

    async fn insert_user(&self, user: &User) -> MarketResult<String>;

    /// First user with this email, if any
    async fn find_user_by_email(&self, email: &str) -> MarketResult<Option<User>>;

    /// Users with the given role, sorted by email ascending
    async fn find_users_by_role(&self, role: UserRole) -> MarketResult<Vec<User>>;

    async fn set_user_verified(&self, id: &str) -> MarketResult<bool>;

    async fn delete_user(&self, id: &str) -> MarketResult<bool>;

    // --- orders -----------------------------------------------------------

    async fn insert_order(&self, order: &Order) -> MarketResult<String>;

    async fn get_order(&self, id: &str) -> MarketResult<Option<Order>>;

    /// Orders placed by a buyer, in insertion order
    async fn find_orders_by_buyer(&self, email: &str) -> MarketResult<Vec<Order>>;

    /// Orders for a seller's listings, in insertion order
    async fn find_orders_by_seller(&self, email: &str) -> MarketResult<Vec<Order>>;

    /// Set `paid` and `transactionId` on an unpaid order. `false` if the
    /// order is absent or already paid.
    async fn mark_order_paid(&self, id: &str, transaction_id: &str) -> MarketResult<bool>;

    async fn delete_order(&self, id: &str) -> MarketResult<bool>;

    // --- payments ---------------------------------------------------------

    async fn insert_payment(&self, payment: &Payment) -> MarketResult<String>;

    async fn delete_payment(&self, id: &str) -> MarketResult<bool>;
}

/// Type alias for a shared store handle (dynamic dispatch)
pub type SharedStore = Arc<dyn MarketStore>;
