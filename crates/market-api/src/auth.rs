//! # Bearer Token Auth
//!
//! `GET /jwt` issues an HS256 token carrying the caller's email. Protected
//! route groups run [`require_auth`], which verifies the token and stores the
//! decoded [`Claims`] in request extensions; admin groups additionally run
//! [`require_admin`].

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use market_core::MarketError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies bearer tokens with a shared secret
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, email: &str) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| MarketError::Internal(format!("token signing failed: {}", e)).into())
    }

    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("token rejected: {}", e);
                ApiError::AuthenticationInvalid
            })
    }
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?;
    let mut parts = raw.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if !scheme.eq_ignore_ascii_case("bearer") || parts.next().is_some() {
        return None;
    }
    Some(token)
}

/// Reject requests without a valid bearer token
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let Some(token) = bearer_token(req.headers()) else {
        warn!(path = %req.uri().path(), "missing bearer token");
        return Err(ApiError::AuthenticationMissing);
    };

    let claims = match state.tokens.verify(token) {
        Ok(claims) => claims,
        Err(err) => {
            warn!(path = %req.uri().path(), "invalid bearer token");
            return Err(err);
        }
    };

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Reject callers whose stored account is not an Admin. Runs after
/// [`require_auth`].
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> ApiResult<Response> {
    let email = req
        .extensions()
        .get::<Claims>()
        .map(|claims| claims.email.clone())
        .ok_or(ApiError::AuthenticationMissing)?;

    if !is_admin(&state, &email).await? {
        warn!(email = %email, path = %req.uri().path(), "admin route denied");
        return Err(ApiError::forbidden("admin role required"));
    }

    Ok(next.run(req).await)
}

pub async fn is_admin(state: &AppState, email: &str) -> ApiResult<bool> {
    Ok(state
        .market
        .store()
        .find_user_by_email(email)
        .await?
        .is_some_and(|user| user.is_admin()))
}

/// Allow the owner of `email`'s data, or an admin
pub async fn ensure_owner(state: &AppState, claims: &Claims, email: &str) -> ApiResult<()> {
    if claims.email == email || is_admin(state, &claims.email).await? {
        return Ok(());
    }
    warn!(caller = %claims.email, owner = %email, "ownership check failed");
    Err(ApiError::forbidden("resource belongs to another account"))
}
