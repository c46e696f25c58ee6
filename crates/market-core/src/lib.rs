//! # market-core
//!
//! Core types and traits for the resale marketplace backend.
//!
//! This crate provides:
//! - `Category`, `Product`, `User`, `Order` and `Payment` documents
//! - `MarketStore` trait for document storage backends, plus `MemoryStore`
//! - `PaymentGateway` trait for payment-intent providers
//! - `Marketplace` flows (listing, ordering, paying) on top of a store
//! - `MarketError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use market_core::{Marketplace, MemoryStore, Order, Product};
//! use std::sync::Arc;
//!
//! let market = Marketplace::new(Arc::new(MemoryStore::new()));
//!
//! // A seller lists a car
//! let product = market
//!     .add_product(Product::new(3, "Toyota Axio", "seller@example.com", 100.0))
//!     .await?;
//!
//! // A buyer orders it; the listing flips to sold
//! let order = market
//!     .place_order(Order::new(product.id.unwrap(), "buyer@example.com", "seller@example.com"))
//!     .await?;
//! ```

pub mod category;
pub mod error;
pub mod marketplace;
pub mod memory;
pub mod money;
pub mod order;
pub mod payment;
pub mod product;
pub mod store;
pub mod user;

// Re-exports for convenience
pub use category::{Category, CategoryCatalog};
pub use error::{MarketError, MarketResult};
pub use marketplace::Marketplace;
pub use memory::MemoryStore;
pub use money::Currency;
pub use order::{dedup_by_buyer, Order, Payment};
pub use payment::{PaymentGateway, PaymentIntent, SharedGateway};
pub use product::{Product, ProductFilter, ProductPatch, ProductStatus};
pub use store::{MarketStore, SharedStore};
pub use user::{User, UserRole};
