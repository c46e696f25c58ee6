use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use market_api::{create_router, AppConfig, AppState};
use market_core::{
    Category, Currency, MarketResult, MarketStore, MemoryStore, PaymentGateway, PaymentIntent,
    User, UserRole,
};
use serde_json::{json, Value};

const ADMIN: &str = "admin@example.com";
const SELLER: &str = "seller@example.com";
const BUYER: &str = "buyer@example.com";

struct FakeGateway;

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: Currency,
    ) -> MarketResult<PaymentIntent> {
        Ok(PaymentIntent {
            id: format!("pi_{amount}"),
            client_secret: format!("pi_{amount}_secret_{}", currency.as_str()),
            amount,
            currency,
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

async fn test_server() -> Result<TestServer> {
    let store = Arc::new(MemoryStore::with_categories(vec![
        Category::new(1, "Sedan"),
        Category::new(2, "SUV"),
        Category::new(3, "Microbus"),
    ]));
    store.insert_user(&User::new(ADMIN, UserRole::Admin)).await?;

    let state = AppState::new(AppConfig::default(), store, Arc::new(FakeGateway));
    Ok(TestServer::new(create_router(state))?)
}

async fn register(server: &TestServer, email: &str, role: &str) -> Value {
    let response = server
        .post("/user")
        .json(&json!({ "email": email, "name": "Test", "userRole": role }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json()
}

async fn token(server: &TestServer, email: &str) -> String {
    let response = server.get(&format!("/jwt?email={email}")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    body["accessToken"].as_str().unwrap_or_default().to_string()
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

async fn list(server: &TestServer, token: &str, category: i64, name: &str, price: f64) -> Value {
    let response = server
        .post("/addProduct")
        .add_header("Authorization", bearer(token))
        .json(&json!({
            "categoryId": category,
            "name": name,
            "ownerEmail": SELLER,
            "price": price,
            "location": "Dhaka",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json()
}

async fn order(server: &TestServer, token: &str, buyer: &str, product_id: &str) -> axum_test::TestResponse {
    server
        .post("/orders")
        .add_header("Authorization", bearer(token))
        .json(&json!({
            "productId": product_id,
            "email": buyer,
            "sellersEmail": SELLER,
        }))
        .await
}

#[tokio::test]
async fn root_and_health_are_public() -> Result<()> {
    let server = test_server().await?;

    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().starts_with("Welcome"));

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");
    Ok(())
}

#[tokio::test]
async fn categories_are_listed() -> Result<()> {
    let server = test_server().await?;

    let body: Value = server.get("/categories").await.json();
    let categories = body.as_array().map(Vec::len);
    assert_eq!(categories, Some(3));
    assert_eq!(body[0]["categoryId"], 1);
    assert!(body[0]["_id"].is_string());
    Ok(())
}

#[tokio::test]
async fn categories_without_numeric_keys_are_listed() -> Result<()> {
    let stored: Category = serde_json::from_value(json!({ "name": "Pickup" }))?;
    let store = Arc::new(MemoryStore::with_categories(vec![stored, Category::new(1, "Sedan")]));
    let state = AppState::new(AppConfig::default(), store, Arc::new(FakeGateway));
    let server = TestServer::new(create_router(state))?;

    let response = server.get("/categories").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body[0]["name"], "Pickup");
    assert!(body[0].get("categoryId").is_none());
    assert_eq!(body[1]["categoryId"], 1);
    Ok(())
}

#[tokio::test]
async fn jwt_requires_a_registered_email() -> Result<()> {
    let server = test_server().await?;

    let response = server.get("/jwt?email=nobody@example.com").await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["accessToken"], "");

    let response = server.get("/jwt").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    register(&server, BUYER, "Buyer").await;
    assert!(!token(&server, BUYER).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_missing_and_invalid_tokens() -> Result<()> {
    let server = test_server().await?;

    let response = server.get(&format!("/myProducts/{SELLER}")).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], 401);

    let response = server
        .get(&format!("/myProducts/{SELLER}"))
        .add_header("Authorization", "Bearer not.a.token")
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = server.get("/allBuyers").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn owner_checks_block_other_accounts() -> Result<()> {
    let server = test_server().await?;
    register(&server, SELLER, "Seller").await;
    register(&server, BUYER, "Buyer").await;
    let seller = token(&server, SELLER).await;
    let buyer = token(&server, BUYER).await;
    let admin = token(&server, ADMIN).await;

    let response = server
        .get(&format!("/myProducts/{SELLER}"))
        .add_header("Authorization", bearer(&buyer))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = server
        .get(&format!("/myProducts/{SELLER}"))
        .add_header("Authorization", bearer(&admin))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let product = list(&server, &seller, 1, "Premio", 90.0).await;
    let id = product["_id"].as_str().unwrap_or_default().to_string();

    let response = server
        .delete(&format!("/products/{id}"))
        .add_header("Authorization", bearer(&buyer))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = server
        .delete(&format!("/products/{id}"))
        .add_header("Authorization", bearer(&seller))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["deletedCount"], 1);

    let response = server.get(&format!("/product/{id}")).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn added_product_is_stamped_available() -> Result<()> {
    let server = test_server().await?;
    register(&server, SELLER, "Seller").await;
    let seller = token(&server, SELLER).await;

    let response = server
        .post("/addProduct")
        .add_header("Authorization", bearer(&seller))
        .json(&json!({
            "categoryId": 3,
            "name": "Hiace",
            "ownerEmail": SELLER,
            "price": 100,
            "status": "sold",
            "isAdvertised": true,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let product: Value = response.json();
    assert!(product["_id"].is_string());
    assert!(product["timestamp"].is_i64());
    assert_eq!(product["status"], "available");
    assert_eq!(product["isAdvertised"], false);

    let stored: Value = server
        .get(&format!("/product/{}", product["_id"].as_str().unwrap_or_default()))
        .await
        .json();
    assert_eq!(stored["status"], "available");
    assert_eq!(stored["timestamp"], product["timestamp"]);
    Ok(())
}

#[tokio::test]
async fn add_product_rejects_invalid_bodies() -> Result<()> {
    let server = test_server().await?;
    register(&server, SELLER, "Seller").await;
    let seller = token(&server, SELLER).await;

    let response = server
        .post("/addProduct")
        .add_header("Authorization", bearer(&seller))
        .json(&json!({ "name": "No category", "ownerEmail": SELLER, "price": 10 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], 400);
    assert!(body["details"].is_string());

    let response = server
        .post("/addProduct")
        .add_header("Authorization", bearer(&seller))
        .json(&json!({ "categoryId": 1, "name": "", "ownerEmail": SELLER, "price": 10 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn category_listing_is_filtered_and_newest_first() -> Result<()> {
    let server = test_server().await?;
    register(&server, SELLER, "Seller").await;
    let seller = token(&server, SELLER).await;

    let older = list(&server, &seller, 3, "Noah", 100.0).await;
    list(&server, &seller, 2, "Harrier", 300.0).await;
    let newer = list(&server, &seller, 3, "Hiace", 150.0).await;

    let body: Value = server.get("/category/3").await.json();
    let products = body.as_array().cloned().unwrap_or_default();
    assert_eq!(products.len(), 2);
    assert!(products.iter().all(|p| p["categoryId"] == 3));
    assert_eq!(products[0]["_id"], newer["_id"]);
    assert_eq!(products[1]["_id"], older["_id"]);

    let response = server.get("/category/suv").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn ordering_marks_product_sold_once() -> Result<()> {
    let server = test_server().await?;
    register(&server, SELLER, "Seller").await;
    register(&server, BUYER, "Buyer").await;
    let seller = token(&server, SELLER).await;
    let buyer = token(&server, BUYER).await;
    let admin = token(&server, ADMIN).await;

    let product = list(&server, &seller, 1, "Allion", 120.0).await;
    let id = product["_id"].as_str().unwrap_or_default().to_string();

    let response = server
        .put(&format!("/setAdvertised/{id}"))
        .add_header("Authorization", bearer(&admin))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let advertised: Value = server.get("/advertisedItems").await.json();
    assert_eq!(advertised.as_array().map(Vec::len), Some(1));

    let response = server
        .put(&format!("/setAdvertised/{id}"))
        .add_header("Authorization", bearer(&admin))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["matchedCount"], 1);

    let response = order(&server, &buyer, BUYER, &id).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let placed: Value = response.json();
    assert_eq!(placed["paid"], false);
    assert_eq!(placed["price"], 120.0);

    let stored: Value = server.get(&format!("/product/{id}")).await.json();
    assert_eq!(stored["status"], "sold");
    assert_eq!(stored["isAdvertised"], false);

    let advertised: Value = server.get("/advertisedItems").await.json();
    assert_eq!(advertised.as_array().map(Vec::len), Some(0));

    let response = order(&server, &buyer, BUYER, &id).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    let orders: Value = server
        .get(&format!("/orders/{BUYER}"))
        .add_header("Authorization", bearer(&buyer))
        .await
        .json();
    assert_eq!(orders.as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn ordering_checks_buyer_and_product() -> Result<()> {
    let server = test_server().await?;
    register(&server, BUYER, "Buyer").await;
    let buyer = token(&server, BUYER).await;

    let response = order(&server, &buyer, BUYER, "missing").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = order(&server, &buyer, "someone@example.com", "missing").await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn my_buyers_lists_each_buyer_once() -> Result<()> {
    let server = test_server().await?;
    register(&server, SELLER, "Seller").await;
    register(&server, BUYER, "Buyer").await;
    register(&server, "other@example.com", "Buyer").await;
    let seller = token(&server, SELLER).await;
    let buyer = token(&server, BUYER).await;
    let other = token(&server, "other@example.com").await;

    for name in ["Axio", "Fielder"] {
        let product = list(&server, &seller, 1, name, 100.0).await;
        let id = product["_id"].as_str().unwrap_or_default();
        assert_eq!(order(&server, &buyer, BUYER, id).await.status_code(), StatusCode::OK);
    }
    let product = list(&server, &seller, 1, "Vitz", 80.0).await;
    let id = product["_id"].as_str().unwrap_or_default();
    let response = order(&server, &other, "other@example.com", id).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = server
        .get(&format!("/myBuyers/{SELLER}"))
        .add_header("Authorization", bearer(&seller))
        .await
        .json();
    let buyers: Vec<&str> = body
        .as_array()
        .map(|orders| orders.iter().filter_map(|o| o["email"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(buyers, vec![BUYER, "other@example.com"]);
    Ok(())
}

#[tokio::test]
async fn payment_flow_marks_order_paid() -> Result<()> {
    let server = test_server().await?;
    register(&server, SELLER, "Seller").await;
    register(&server, BUYER, "Buyer").await;
    let seller = token(&server, SELLER).await;
    let buyer = token(&server, BUYER).await;

    let product = list(&server, &seller, 2, "Prado", 25.5).await;
    let placed: Value = order(&server, &buyer, BUYER, product["_id"].as_str().unwrap_or_default())
        .await
        .json();
    let order_id = placed["_id"].as_str().unwrap_or_default().to_string();

    let response = server
        .post("/create-payment-intent")
        .add_header("Authorization", bearer(&buyer))
        .json(&json!({ "price": 25.5 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["clientSecret"], "pi_2550_secret_usd");

    let response = server
        .post("/create-payment-intent")
        .add_header("Authorization", bearer(&buyer))
        .json(&json!({ "price": 0 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let payment = json!({ "orderId": order_id, "transactionId": "pi_2550", "price": 25.5 });

    let response = server
        .post("/payments")
        .add_header("Authorization", bearer(&seller))
        .json(&payment)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = server
        .post("/payments")
        .add_header("Authorization", bearer(&buyer))
        .json(&payment)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let recorded: Value = response.json();
    assert!(recorded["_id"].is_string());
    assert_eq!(recorded["email"], BUYER);

    let stored: Value = server
        .get(&format!("/order/{order_id}"))
        .add_header("Authorization", bearer(&seller))
        .await
        .json();
    assert_eq!(stored["paid"], true);
    assert_eq!(stored["transactionId"], "pi_2550");

    let response = server
        .post("/payments")
        .add_header("Authorization", bearer(&buyer))
        .json(&payment)
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn admin_routes_require_admin_role() -> Result<()> {
    let server = test_server().await?;
    register(&server, "zed@example.com", "Buyer").await;
    register(&server, BUYER, "Buyer").await;
    let user = register(&server, SELLER, "Seller").await;
    let buyer = token(&server, BUYER).await;
    let admin = token(&server, ADMIN).await;

    let response = server
        .get("/allBuyers")
        .add_header("Authorization", bearer(&buyer))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let body: Value = server
        .get("/allBuyers")
        .add_header("Authorization", bearer(&admin))
        .await
        .json();
    let emails: Vec<&str> = body
        .as_array()
        .map(|users| users.iter().filter_map(|u| u["email"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(emails, vec![BUYER, "zed@example.com"]);

    let user_id = user["_id"].as_str().unwrap_or_default();
    assert_eq!(user["isUserVerified"], false);
    let response = server
        .put(&format!("/verifyUser/{user_id}"))
        .add_header("Authorization", bearer(&admin))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let sellers: Value = server
        .get("/allSellers")
        .add_header("Authorization", bearer(&admin))
        .await
        .json();
    assert_eq!(sellers[0]["isUserVerified"], true);

    let response = server
        .put("/setAdvertised/missing")
        .add_header("Authorization", bearer(&admin))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .delete(&format!("/user/{user_id}"))
        .add_header("Authorization", bearer(&admin))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let response = server.get(&format!("/jwt?email={SELLER}")).await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn reported_products_are_moderated_by_admins() -> Result<()> {
    let server = test_server().await?;
    register(&server, SELLER, "Seller").await;
    register(&server, BUYER, "Buyer").await;
    let seller = token(&server, SELLER).await;
    let buyer = token(&server, BUYER).await;
    let admin = token(&server, ADMIN).await;

    let product = list(&server, &seller, 1, "Corolla", 100.0).await;
    let id = product["_id"].as_str().unwrap_or_default().to_string();

    let response = server
        .put(&format!("/reportProduct/{id}"))
        .add_header("Authorization", bearer(&buyer))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["matchedCount"], 1);
    assert!(body.get("modifiedCount").is_none());

    let response = server
        .put("/reportProduct/missing")
        .add_header("Authorization", bearer(&buyer))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let reported: Value = server
        .get("/reportedProducts")
        .add_header("Authorization", bearer(&admin))
        .await
        .json();
    assert_eq!(reported[0]["_id"], product["_id"]);

    let response = server
        .delete(&format!("/reportedProducts/{id}"))
        .add_header("Authorization", bearer(&admin))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .delete(&format!("/reportedProducts/{id}"))
        .add_header("Authorization", bearer(&admin))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn admin_accounts_cannot_self_register() -> Result<()> {
    let server = test_server().await?;
    let response = server
        .post("/user")
        .json(&json!({ "email": "mallory@example.com", "userRole": "Admin" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    Ok(())
}
