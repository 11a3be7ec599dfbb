use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use carkeeper_api::app::{build_router, services::AppServices};
use carkeeper_api::config::CorsOrigins;
use carkeeper_auth::{Hs256Jwt, JwtClaims, Role};
use carkeeper_core::UserId;
use carkeeper_infra::{InMemoryStore, demo};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    demo: demo::DemoCatalog,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over a seeded in-memory store, on an ephemeral port.
        let store = InMemoryStore::new();
        let demo = demo::seed(&store);
        let jwt = Arc::new(Hs256Jwt::new(JWT_SECRET, ChronoDuration::hours(1)));
        let services = Arc::new(AppServices::new(Arc::new(store), jwt.clone()).with_password_cost(4));
        let app = build_router(services, jwt, &CorsOrigins::Any);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, demo, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(sub: UserId, role: Role) -> String {
    let now = Utc::now();
    let claims = JwtClaims::new(sub, role, now, now + ChronoDuration::minutes(10));

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn json_body(res: reqwest::Response) -> Value {
    res.json().await.expect("response is not json")
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/api/orders")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "unauthorized");

    let res = client
        .get(srv.url("/api/orders"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let srv = TestServer::spawn().await;
    let past = Utc::now() - ChronoDuration::hours(2);
    let claims = JwtClaims::new(UserId::new(), Role::Customer, past, past + ChronoDuration::minutes(10));
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let res = reqwest::Client::new()
        .get(srv.url("/api/auth/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_login_and_me() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/auth/register"))
        .json(&json!({
            "first_name": "Grace",
            "last_name": "Hopper",
            "email": "grace@example.com",
            "password": "cobol-rules",
            "role": "admin",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = json_body(res).await;
    assert_eq!(body["success"], true);
    // Self-registration never grants staff.
    assert_eq!(body["data"]["role"], "customer");
    assert_eq!(body["data"]["full_name"], "Grace Hopper");
    assert!(body["data"].get("password_hash").is_none());

    let res = client
        .post(srv.url("/api/auth/register"))
        .json(&json!({
            "first_name": "Grace",
            "last_name": "Again",
            "email": "GRACE@example.com",
            "password": "cobol-rules",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": "grace@example.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(res).await["message"], "invalid credentials");

    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": "grace@example.com", "password": "cobol-rules" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let res = client
        .get(srv.url("/api/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["data"]["email"], "grace@example.com");
}

#[tokio::test]
async fn catalog_lists_and_filters_trims() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/api/catalog/brands")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["data"][0]["name"], "Toyota");

    let res = client.get(srv.url("/api/catalog/models")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(srv.url(&format!("/api/catalog/trims?brand_id={},garbage", srv.demo.brand_id)))
        .send()
        .await
        .unwrap();
    let body = json_body(res).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["brand_name"], "Toyota");
    assert_eq!(body["data"][0]["base_price"], 30000);

    let res = client
        .get(srv.url("/api/catalog/trims?max_price=20000"))
        .send()
        .await
        .unwrap();
    assert!(json_body(res).await["data"].as_array().unwrap().is_empty());

    let res = client
        .get(srv.url(&format!("/api/catalog/trims/{}", UserId::new())))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn configuration_lifecycle_through_order() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(UserId::new(), Role::Customer);

    let res = client
        .post(srv.url("/api/configurator/configurations"))
        .bearer_auth(&token)
        .json(&json!({
            "trim_id": srv.demo.trim_id,
            "color_id": srv.demo.color_id,
            "option_ids": srv.demo.option_ids,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = json_body(res).await;
    assert_eq!(body["data"]["status"], "draft");
    assert_eq!(body["data"]["total_price"], 31700);
    let id = body["data"]["configuration_id"].as_str().unwrap().to_string();
    let path = format!("/api/configurator/configurations/{id}");

    let res = client
        .put(srv.url(&path))
        .bearer_auth(&token)
        .json(&json!({ "status": "unknown" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["error"], "invalid_status");

    let res = client
        .put(srv.url(&path))
        .bearer_auth(&token)
        .json(&json!({ "status": "confirmed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["data"]["total_price"], 31700);

    let res = client
        .put(srv.url(&path))
        .bearer_auth(&token)
        .json(&json!({
            "trim_id": srv.demo.trim_id,
            "color_id": srv.demo.color_id,
            "option_ids": [],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(res).await["error"], "invalid_state");

    let res = client
        .delete(srv.url(&path))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let other = mint_jwt(UserId::new(), Role::Customer);
    let res = client.get(srv.url(&path)).bearer_auth(&other).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&token)
        .json(&json!({ "configuration_id": id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order = json_body(res).await;
    assert_eq!(order["data"]["status"], "pending");
    assert_eq!(order["data"]["final_price"], 31700);
    assert_eq!(order["data"]["configuration"]["status"], "ordered");

    let res = client.get(srv.url(&path)).bearer_auth(&token).send().await.unwrap();
    assert_eq!(json_body(res).await["data"]["status"], "ordered");

    let res = client
        .get(srv.url("/api/profile/configurations"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(json_body(res).await["data"].as_array().unwrap().len(), 1);

    // Status changes are back-office only.
    let order_id = order["data"]["order_id"].as_str().unwrap();
    let status_path = format!("/api/orders/{order_id}/status");
    let res = client
        .patch(srv.url(&status_path))
        .bearer_auth(&token)
        .json(&json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let manager = mint_jwt(UserId::new(), Role::Manager);
    let res = client
        .patch(srv.url(&status_path))
        .bearer_auth(&manager)
        .json(&json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["data"]["status"], "approved");
}

#[tokio::test]
async fn draft_configuration_can_be_deleted() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(UserId::new(), Role::Customer);

    let res = client
        .post(srv.url("/api/configurator/configurations"))
        .bearer_auth(&token)
        .json(&json!({ "trim_id": srv.demo.trim_id, "color_id": srv.demo.color_id }))
        .send()
        .await
        .unwrap();
    let body = json_body(res).await;
    assert_eq!(body["data"]["total_price"], 30500);
    let path = format!(
        "/api/configurator/configurations/{}",
        body["data"]["configuration_id"].as_str().unwrap()
    );

    let res = client.delete(srv.url(&path)).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url(&path)).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_body_gets_the_error_envelope() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(UserId::new(), Role::Customer);

    let res = client
        .post(srv.url("/api/configurator/configurations"))
        .bearer_auth(&token)
        .json(&json!({ "trim_id": "not-a-uuid", "color_id": srv.demo.color_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "validation_error");

    let res = client
        .post(srv.url("/api/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["success"], false);
}

#[tokio::test]
async fn car_registration_and_service_booking() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(UserId::new(), Role::Customer);

    let res = client
        .post(srv.url("/api/profile/cars"))
        .bearer_auth(&token)
        .json(&json!({
            "trim_id": srv.demo.trim_id,
            "color_id": srv.demo.color_id,
            "vin": "SHORTVIN",
            "year": 2020,
            "current_mileage": 100,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/api/profile/cars"))
        .bearer_auth(&token)
        .json(&json!({
            "trim_id": srv.demo.trim_id,
            "color_id": srv.demo.color_id,
            "vin": "JTDBE32K520123456",
            "year": 2020,
            "current_mileage": 100,
            "purchase_date": "2020-03-15",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let car = json_body(res).await;
    let car_id = car["data"]["user_car_id"].as_str().unwrap().to_string();

    let res = client
        .get(srv.url("/api/service/user-cars"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(json_body(res).await["data"].as_array().unwrap().len(), 1);

    let res = client
        .get(srv.url("/api/service/branches?is_active=true"))
        .send()
        .await
        .unwrap();
    assert_eq!(json_body(res).await["data"].as_array().unwrap().len(), 1);

    let res = client
        .post(srv.url("/api/service/appointments"))
        .bearer_auth(&token)
        .json(&json!({
            "user_car_id": car_id,
            "branch_id": srv.demo.branch_id,
            "service_type_ids": srv.demo.service_type_ids,
            "appointment_date": (Utc::now() + ChronoDuration::days(2)).to_rfc3339(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let appointment = json_body(res).await;
    assert_eq!(appointment["data"]["status"], "scheduled");
    let cancel = format!(
        "/api/service/appointments/{}/cancel",
        appointment["data"]["service_appointment_id"].as_str().unwrap()
    );

    let res = client.patch(srv.url(&cancel)).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["data"]["status"], "cancelled");
}

#[tokio::test]
async fn news_publishing_is_staff_only() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let customer = mint_jwt(UserId::new(), Role::Customer);
    let admin = mint_jwt(UserId::new(), Role::Admin);
    let article = json!({ "title": "New showroom", "content": "Opening on Monday." });

    let res = client
        .post(srv.url("/api/news"))
        .bearer_auth(&customer)
        .json(&article)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(srv.url("/api/news"))
        .bearer_auth(&admin)
        .json(&article)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let id = json_body(res).await["data"]["news_id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = client
        .get(srv.url("/api/news?is_published=true"))
        .send()
        .await
        .unwrap();
    assert!(json_body(res).await["data"].as_array().unwrap().is_empty());

    let res = client
        .patch(srv.url(&format!("/api/news/{id}/publish")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url(&format!("/api/news/{id}"))).send().await.unwrap();
    let body = json_body(res).await;
    assert_eq!(body["data"]["is_published"], true);
    assert!(body["data"]["published_at"].is_string());
}
