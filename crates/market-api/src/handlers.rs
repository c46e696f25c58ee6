//! # Request Handlers
//!
//! Axum request handlers for the marketplace API. Each handler does its
//! access check, calls into [`Marketplace`](market_core::Marketplace) or the
//! store, and returns JSON.

use crate::auth::{ensure_owner, is_admin, Claims};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{FromRequest, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use market_core::{
    Category, MarketError, Order, Payment, Product, ProductFilter, User, UserRole,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// `axum::Json` with rejections rendered as [`ApiError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Write acknowledgement for updates and deletes. Updates report the matched
/// document, which may already have carried the new values.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteAck {
    pub acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<u64>,
}

impl WriteAck {
    pub fn matched() -> Json<Self> {
        Json(Self {
            acknowledged: true,
            matched_count: Some(1),
            deleted_count: None,
        })
    }

    pub fn deleted() -> Json<Self> {
        Json(Self {
            acknowledged: true,
            matched_count: None,
            deleted_count: Some(1),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentIntentRequest {
    pub price: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

// =============================================================================
// Service
// =============================================================================

pub async fn root() -> &'static str {
    "Welcome to Authois 2nd hand Product resale server"
}

/// Health check endpoint; 503 when the store is unreachable
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.market.store();
    let (status, label) = match store.ping().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            warn!("health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "degraded")
        }
    };

    (
        status,
        Json(serde_json::json!({
            "status": label,
            "service": "resale-market",
            "version": env!("CARGO_PKG_VERSION"),
            "storage": store.backend_name(),
            "payments": state.payments.provider_name(),
        })),
    )
}

// =============================================================================
// Catalog
// =============================================================================

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.market.store().list_categories().await?))
}

pub async fn category_products(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.market.products_in_category(&id).await?))
}

pub async fn advertised_items(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    let filter = ProductFilter::advertised_available();
    Ok(Json(state.market.store().find_products(&filter).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.market.product(&id).await?))
}

// =============================================================================
// Listings
// =============================================================================

pub async fn my_products(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(email): Path<String>,
) -> ApiResult<Json<Vec<Product>>> {
    ensure_owner(&state, &claims, &email).await?;
    let filter = ProductFilter::owned_by(email);
    Ok(Json(state.market.store().find_products(&filter).await?))
}

#[instrument(skip(state, claims, product), fields(caller = %claims.email))]
pub async fn add_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(product): ApiJson<Product>,
) -> ApiResult<Json<Product>> {
    ensure_owner(&state, &claims, &product.owner_email).await?;
    Ok(Json(state.market.add_product(product).await?))
}

#[instrument(skip(state, claims), fields(caller = %claims.email))]
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<Json<WriteAck>> {
    let product = state.market.product(&id).await?;
    ensure_owner(&state, &claims, &product.owner_email).await?;
    state.market.delete_product(&id).await?;
    Ok(WriteAck::deleted())
}

#[instrument(skip(state, claims), fields(caller = %claims.email))]
pub async fn report_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<Json<WriteAck>> {
    state.market.report_product(&id).await?;
    Ok(WriteAck::matched())
}

pub async fn reported_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    let filter = ProductFilter::reported();
    Ok(Json(state.market.store().find_products(&filter).await?))
}

#[instrument(skip(state))]
pub async fn set_advertised(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<WriteAck>> {
    state.market.advertise_product(&id).await?;
    Ok(WriteAck::matched())
}

#[instrument(skip(state))]
pub async fn delete_reported_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<WriteAck>> {
    state.market.delete_product(&id).await?;
    Ok(WriteAck::deleted())
}

// =============================================================================
// Users
// =============================================================================

#[instrument(skip(state, user), fields(email = %user.email))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(user): ApiJson<User>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.market.register_user(user).await?))
}

pub async fn user_by_email(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(email): Path<String>,
) -> ApiResult<Json<User>> {
    ensure_owner(&state, &claims, &email).await?;
    Ok(Json(state.market.user_by_email(&email).await?))
}

pub async fn all_buyers(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.market.store().find_users_by_role(UserRole::Buyer).await?))
}

pub async fn all_sellers(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.market.store().find_users_by_role(UserRole::Seller).await?))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<WriteAck>> {
    state.market.delete_user(&id).await?;
    Ok(WriteAck::deleted())
}

#[instrument(skip(state))]
pub async fn verify_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<WriteAck>> {
    state.market.verify_user(&id).await?;
    Ok(WriteAck::matched())
}

// =============================================================================
// Orders
// =============================================================================

#[instrument(skip(state, claims, order), fields(caller = %claims.email, product_id = %order.product_id))]
pub async fn place_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(order): ApiJson<Order>,
) -> ApiResult<Json<Order>> {
    ensure_owner(&state, &claims, &order.email).await?;
    Ok(Json(state.market.place_order(order).await?))
}

pub async fn orders_by_buyer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(email): Path<String>,
) -> ApiResult<Json<Vec<Order>>> {
    ensure_owner(&state, &claims, &email).await?;
    Ok(Json(state.market.store().find_orders_by_buyer(&email).await?))
}

/// Visible to the buyer, the seller and admins
pub async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<Json<Order>> {
    let order = state.market.order(&id).await?;
    let is_party = claims.email == order.email || claims.email == order.sellers_email;
    if !is_party && !is_admin(&state, &claims.email).await? {
        return Err(ApiError::forbidden("order belongs to another account"));
    }
    Ok(Json(order))
}

pub async fn my_buyers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(email): Path<String>,
) -> ApiResult<Json<Vec<Order>>> {
    ensure_owner(&state, &claims, &email).await?;
    Ok(Json(state.market.buyers_of(&email).await?))
}

// =============================================================================
// Payments
// =============================================================================

#[instrument(skip(state, claims, request), fields(caller = %claims.email))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(request): ApiJson<PaymentIntentRequest>,
) -> ApiResult<Json<PaymentIntentResponse>> {
    let currency = state.config.currency;
    let amount = currency.charge_amount(request.price)?;

    let intent = state
        .payments
        .create_payment_intent(amount, currency)
        .await?;

    info!(
        "Created {} payment intent {} for {} {}",
        state.payments.provider_name(),
        intent.id,
        amount,
        currency
    );

    Ok(Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}

#[instrument(skip(state, claims, payment), fields(caller = %claims.email, order_id = %payment.order_id))]
pub async fn record_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(mut payment): ApiJson<Payment>,
) -> ApiResult<Json<Payment>> {
    let order = state.market.order(&payment.order_id).await?;
    if claims.email != order.email && !is_admin(&state, &claims.email).await? {
        return Err(ApiError::forbidden("only the buyer can pay for this order"));
    }
    payment.email.get_or_insert_with(|| order.email.clone());
    Ok(Json(state.market.record_payment(payment).await?))
}

// =============================================================================
// Tokens
// =============================================================================

/// Issue a bearer token for a registered email. Unknown emails get an empty
/// token with 403.
pub async fn issue_token(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> ApiResult<Response> {
    let email = query
        .email
        .filter(|email| !email.trim().is_empty())
        .ok_or_else(|| MarketError::validation("email query parameter is required"))?;

    if state.market.store().find_user_by_email(&email).await?.is_none() {
        warn!(email = %email, "token requested for unknown user");
        let body = TokenResponse {
            access_token: String::new(),
        };
        return Ok((StatusCode::FORBIDDEN, Json(body)).into_response());
    }

    let access_token = state.tokens.issue(&email)?;
    info!(email = %email, "issued access token");
    Ok(Json(TokenResponse { access_token }).into_response())
}
