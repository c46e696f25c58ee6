//! # market-mongo
//!
//! MongoDB backend for the resale marketplace.
//!
//! ```rust,ignore
//! use market_mongo::MongoStore;
//!
//! let store = MongoStore::connect(&uri, "authoisCarsResale").await?;
//! let categories = store.list_categories().await?;
//! ```
//!
//! Collections: `categories`, `products`, `users`, `orders`, `payments`.
//! Identifiers are ObjectIds, exposed to callers as 24-character hex strings.

pub mod convert;
pub mod store;

pub use store::MongoStore;
