//! # In-Memory Store
//!
//! `MarketStore` backed by vectors behind a `tokio::sync::RwLock`. Used for
//! local development without a database and by the test suites. Vector
//! order is the storage-native order.

use crate::category::Category;
use crate::error::MarketResult;
use crate::order::{Order, Payment};
use crate::product::{Product, ProductFilter, ProductPatch};
use crate::store::MarketStore;
use crate::user::{User, UserRole};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Collections {
    categories: Vec<Category>,
    products: Vec<Product>,
    users: Vec<User>,
    orders: Vec<Order>,
    payments: Vec<Payment>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn with_id<T: Clone>(doc: &T, set: impl FnOnce(&mut T, String)) -> (T, String) {
    let id = new_id();
    let mut stored = doc.clone();
    set(&mut stored, id.clone());
    (stored, id)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with categories
    pub fn with_categories(categories: Vec<Category>) -> Self {
        let categories = categories
            .into_iter()
            .map(|mut c| {
                c.id.get_or_insert_with(new_id);
                c
            })
            .collect();

        Self {
            inner: RwLock::new(Collections {
                categories,
                ..Default::default()
            }),
        }
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn list_categories(&self) -> MarketResult<Vec<Category>> {
        Ok(self.inner.read().await.categories.clone())
    }

    async fn find_products(&self, filter: &ProductFilter) -> MarketResult<Vec<Product>> {
        let inner = self.inner.read().await;
        let mut products: Vec<Product> = inner
            .products
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        if filter.newest_first {
            products.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        }
        Ok(products)
    }

    async fn get_product(&self, id: &str) -> MarketResult<Option<Product>> {
        let inner = self.inner.read().await;
        Ok(inner
            .products
            .iter()
            .find(|p| p.id.as_deref() == Some(id))
            .cloned())
    }

    async fn insert_product(&self, product: &Product) -> MarketResult<String> {
        let (stored, id) = with_id(product, |p, id| p.id = Some(id));
        self.inner.write().await.products.push(stored);
        Ok(id)
    }

    async fn update_product(&self, id: &str, patch: &ProductPatch) -> MarketResult<bool> {
        let mut inner = self.inner.write().await;
        match inner
            .products
            .iter_mut()
            .find(|p| p.id.as_deref() == Some(id) && patch.allows(p))
        {
            Some(product) => {
                patch.apply(product);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_product(&self, id: &str) -> MarketResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.products.len();
        inner.products.retain(|p| p.id.as_deref() != Some(id));
        Ok(inner.products.len() != before)
    }

    async fn insert_user(&self, user: &User) -> MarketResult<String> {
        let (stored, id) = with_id(user, |u, id| u.id = Some(id));
        self.inner.write().await.users.push(stored);
        Ok(id)
    }

    async fn find_user_by_email(&self, email: &str) -> MarketResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_users_by_role(&self, role: UserRole) -> MarketResult<Vec<User>> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner
            .users
            .iter()
            .filter(|u| u.user_role == role)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn set_user_verified(&self, id: &str) -> MarketResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.users.iter_mut().find(|u| u.id.as_deref() == Some(id)) {
            Some(user) => {
                user.is_user_verified = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: &str) -> MarketResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.users.len();
        inner.users.retain(|u| u.id.as_deref() != Some(id));
        Ok(inner.users.len() != before)
    }

    async fn insert_order(&self, order: &Order) -> MarketResult<String> {
        let (stored, id) = with_id(order, |o, id| o.id = Some(id));
        self.inner.write().await.orders.push(stored);
        Ok(id)
    }

    async fn get_order(&self, id: &str) -> MarketResult<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .find(|o| o.id.as_deref() == Some(id))
            .cloned())
    }

    async fn find_orders_by_buyer(&self, email: &str) -> MarketResult<Vec<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .filter(|o| o.email == email)
            .cloned()
            .collect())
    }

    async fn find_orders_by_seller(&self, email: &str) -> MarketResult<Vec<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .filter(|o| o.sellers_email == email)
            .cloned()
            .collect())
    }

    async fn mark_order_paid(&self, id: &str, transaction_id: &str) -> MarketResult<bool> {
        let mut inner = self.inner.write().await;
        match inner
            .orders
            .iter_mut()
            .find(|o| o.id.as_deref() == Some(id) && !o.paid)
        {
            Some(order) => {
                order.paid = true;
                order.transaction_id = Some(transaction_id.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_order(&self, id: &str) -> MarketResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.orders.len();
        inner.orders.retain(|o| o.id.as_deref() != Some(id));
        Ok(inner.orders.len() != before)
    }

    async fn insert_payment(&self, payment: &Payment) -> MarketResult<String> {
        let (stored, id) = with_id(payment, |p, id| p.id = Some(id));
        self.inner.write().await.payments.push(stored);
        Ok(id)
    }

    async fn delete_payment(&self, id: &str) -> MarketResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.payments.len();
        inner.payments.retain(|p| p.id.as_deref() != Some(id));
        Ok(inner.payments.len() != before)
    }
}
