//! # Routes
//!
//! Axum router configuration for the marketplace API. Routes are grouped by
//! the access they require; each group carries its own auth layers.

use crate::auth::{require_admin, require_auth};
use crate::handlers;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Public:
///   - GET  /, /health
///   - GET  /categories, /category/{id}, /advertisedItems, /product/{id}
///   - GET  /jwt?email=
///   - POST /user
///
/// - Bearer token (owner checks inside the handlers):
///   - GET    /myProducts/{email}, /users/{email}, /orders/{email}, /order/{id}, /myBuyers/{email}
///   - POST   /addProduct, /orders, /create-payment-intent, /payments
///   - PUT    /reportProduct/{id}
///   - DELETE /products/{id}
///
/// - Admin:
///   - GET    /reportedProducts, /allBuyers, /allSellers
///   - PUT    /setAdvertised/{id}, /verifyUser/{id}
///   - DELETE /reportedProducts/{id}, /user/{id}
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public_routes = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Catalog
        .route("/categories", get(handlers::list_categories))
        .route("/category/{id}", get(handlers::category_products))
        .route("/advertisedItems", get(handlers::advertised_items))
        .route("/product/{id}", get(handlers::get_product))
        // Accounts
        .route("/jwt", get(handlers::issue_token))
        .route("/user", post(handlers::create_user));

    let member_routes = Router::new()
        // Listings
        .route("/myProducts/{email}", get(handlers::my_products))
        .route("/addProduct", post(handlers::add_product))
        .route("/products/{id}", delete(handlers::delete_product))
        .route("/reportProduct/{id}", put(handlers::report_product))
        // Accounts
        .route("/users/{email}", get(handlers::user_by_email))
        // Orders
        .route("/orders", post(handlers::place_order))
        .route("/orders/{email}", get(handlers::orders_by_buyer))
        .route("/order/{id}", get(handlers::get_order))
        .route("/myBuyers/{email}", get(handlers::my_buyers))
        // Payments
        .route("/create-payment-intent", post(handlers::create_payment_intent))
        .route("/payments", post(handlers::record_payment))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Layers run outermost-last: the token is verified before the role lookup
    let admin_routes = Router::new()
        .route("/reportedProducts", get(handlers::reported_products))
        .route("/reportedProducts/{id}", delete(handlers::delete_reported_product))
        .route("/setAdvertised/{id}", put(handlers::set_advertised))
        .route("/allBuyers", get(handlers::all_buyers))
        .route("/allSellers", get(handlers::all_sellers))
        .route("/user/{id}", delete(handlers::delete_user))
        .route("/verifyUser/{id}", put(handlers::verify_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(member_routes)
        .merge(admin_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}
