//! 集成测试共用的装配代码
#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use merchant_oauth::AppConfig;
use merchant_oauth::app::AppContext;
use merchant_oauth::credentials::{CredentialStore, MemoryCredentialStore, StoredCredential};
use merchant_oauth::provider::{ProviderApi, SquareClient};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::MockServer;

pub const APP_ID: &str = "sq0idp-integration";
pub const APP_SECRET: &str = "sq0csp-integration";

/// 指向 wiremock 的完整上下文
pub struct TestEnv {
    pub server: MockServer,
    pub store: Arc<MemoryCredentialStore>,
    pub context: Arc<AppContext>,
}

impl TestEnv {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let server = MockServer::start().await;

        let mut config = AppConfig::default();
        config.provider.application_id = APP_ID.to_string();
        config.provider.application_secret = APP_SECRET.to_string();
        config.provider.base_url = Some(server.uri());
        config.provider.timeout_seconds = 1;
        config.oauth.public_domain = "https://merchant.example.com".to_string();
        customize(&mut config);

        let api: Arc<dyn ProviderApi> = Arc::new(SquareClient::new(&config.provider).unwrap());
        let store = Arc::new(MemoryCredentialStore::new());
        let context = AppContext::new(Arc::new(config), api, store.clone()).unwrap();

        Self {
            server,
            store,
            context,
        }
    }

    pub fn oauth(&self) -> Router {
        merchant_oauth::server::oauth_router(Arc::clone(&self.context))
    }

    pub fn webhook(&self) -> Router {
        merchant_oauth::server::webhook_router(Arc::clone(&self.context))
    }

    pub async fn store_token(&self, location_id: &str, merchant_id: &str, access_token: &str) {
        self.store
            .set(
                location_id,
                StoredCredential {
                    merchant_id: merchant_id.to_string(),
                    access_token: access_token.to_string(),
                    refresh_token: Some(format!("{access_token}-refresh")),
                    expires_at: Utc::now() + Duration::days(30),
                    updated_at: Utc::now(),
                },
            )
            .await
            .unwrap();
    }
}

pub async fn get(router: Router, uri: &str) -> (StatusCode, String) {
    let response = router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub async fn post_webhook(router: Router, body: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::post("/webhook")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// 从入口页 HTML 中取出授权链接
pub fn extract_authorize_url(html: &str) -> String {
    let start = html.find("href=\"").unwrap() + "href=\"".len();
    let end = start + html[start..].find('"').unwrap();
    html[start..end]
        .replace("&#x2F;", "/")
        .replace("&amp;", "&")
}

pub fn token_body(merchant_id: &str, access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_at": "2030-01-01T00:00:00Z",
        "merchant_id": merchant_id,
        "refresh_token": format!("{access_token}-refresh"),
        "short_lived": false
    })
}

pub fn merchant_body(merchant_id: &str, business_name: &str) -> Value {
    json!({
        "merchant": {
            "id": merchant_id,
            "business_name": business_name,
            "country": "US",
            "language_code": "en-US",
            "currency": "USD",
            "status": "ACTIVE"
        }
    })
}

pub fn locations_body(locations: &[(&str, &str)]) -> Value {
    let items: Vec<Value> = locations
        .iter()
        .map(|(id, name)| json!({"id": id, "name": name, "status": "ACTIVE"}))
        .collect();
    json!({ "locations": items })
}

pub fn payment_event(event_id: &str, location_id: &str) -> Value {
    json!({
        "merchant_id": "M1",
        "type": "payment.created",
        "event_id": event_id,
        "data": {
            "type": "payment",
            "id": "PAY-1",
            "object": {
                "payment": {
                    "id": "PAY-1",
                    "location_id": location_id,
                    "amount_money": { "amount": 2500, "currency": "USD" }
                }
            }
        }
    })
}
