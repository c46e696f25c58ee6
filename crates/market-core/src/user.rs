//! # User Documents

use crate::error::{MarketError, MarketResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Account role chosen at signup (Admin is assigned out of band)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Buyer,
    Seller,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Buyer => "Buyer",
            UserRole::Seller => "Seller",
            UserRole::Admin => "Admin",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Buyer
    }
}

/// A registered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Lookup key; not unique at the storage level
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub user_role: UserRole,

    #[serde(default)]
    pub is_user_verified: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn new(email: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: None,
            email: email.into(),
            name: None,
            user_role: role,
            is_user_verified: false,
            extra: Map::new(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user_role == UserRole::Admin
    }

    pub fn validate(&self) -> MarketResult<()> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(MarketError::validation(format!(
                "a valid email is required, got {:?}",
                self.email
            )));
        }
        Ok(())
    }
}
