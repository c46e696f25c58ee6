//! # market-api
//!
//! HTTP API layer for the resale marketplace.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for categories, listings, users, orders and payments
//! - Bearer token issuance and the per-group auth gate
//!
//! ## Endpoints
//!
//! | Method | Path | Access |
//! |--------|------|--------|
//! | GET | `/categories` | public |
//! | GET | `/category/{id}` | public |
//! | GET | `/advertisedItems` | public |
//! | GET | `/product/{id}` | public |
//! | GET | `/jwt?email=` | public |
//! | POST | `/user` | public |
//! | GET | `/myProducts/{email}` | owner |
//! | POST | `/addProduct` | owner |
//! | DELETE | `/products/{id}` | owner |
//! | PUT | `/reportProduct/{id}` | token |
//! | GET | `/users/{email}` | owner |
//! | POST | `/orders` | owner |
//! | GET | `/orders/{email}` | owner |
//! | GET | `/order/{id}` | buyer or seller |
//! | GET | `/myBuyers/{email}` | owner |
//! | POST | `/create-payment-intent` | token |
//! | POST | `/payments` | buyer |
//! | GET | `/reportedProducts` | admin |
//! | DELETE | `/reportedProducts/{id}` | admin |
//! | PUT | `/setAdvertised/{id}` | admin |
//! | GET | `/allBuyers` | admin |
//! | GET | `/allSellers` | admin |
//! | DELETE | `/user/{id}` | admin |
//! | PUT | `/verifyUser/{id}` | admin |
//!
//! Admins pass every owner check.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{Claims, TokenService};
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use state::{AppConfig, AppState};
