//! # Webhook 服务处理器

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use super::AppState;
use super::response::{MessageResponse, error_reply, messages};
use crate::logging::{LogComponent, LogStage};
use crate::webhook::{WebhookEvent, WebhookOutcome, is_empty_payload};
use crate::{lerror, lwarn};

/// `POST /webhook`
///
/// 400：请求体不是 JSON 或为空；500：缺少必需字段或内部错误；
/// 其余情况（包括找不到凭据）一律 200，避免提供商重复投递。
pub async fn receive(State(state): State<AppState>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("webhook", request_id = %request_id);
    handle(&state, &request_id, &body).instrument(span).await
}

async fn handle(state: &AppState, request_id: &str, body: &[u8]) -> Response {
    let payload = match serde_json::from_slice::<Value>(body) {
        Ok(value) if !is_empty_payload(&value) => value,
        Ok(_) | Err(_) => {
            lwarn!(
                request_id,
                LogStage::Webhook,
                LogComponent::Webhook,
                "parse",
                &format!("请求体不是有效 JSON ({} bytes)", body.len())
            );
            return MessageResponse::reply(StatusCode::BAD_REQUEST, messages::NO_JSON);
        }
    };

    let event: WebhookEvent = match serde_json::from_value(payload) {
        Ok(event) => event,
        Err(err) => {
            lerror!(
                request_id,
                LogStage::Webhook,
                LogComponent::Webhook,
                "parse",
                &format!("❌ Error handling webhook: {err}")
            );
            return MessageResponse::reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                messages::INTERNAL_ERROR,
            );
        }
    };

    match state.webhooks.process(request_id, &event).await {
        Ok(WebhookOutcome::Processed(_)) => {
            MessageResponse::reply(StatusCode::OK, messages::PROCESSED)
        }
        Ok(WebhookOutcome::NoCredential) => {
            MessageResponse::reply(StatusCode::OK, messages::NO_TOKEN)
        }
        Ok(WebhookOutcome::Duplicate) => {
            MessageResponse::reply(StatusCode::OK, messages::DUPLICATE)
        }
        Err(err) => error_reply(request_id, LogStage::Webhook, &err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppContext;
    use crate::credentials::{CredentialStore, MemoryCredentialStore};
    use crate::provider::{MockProviderApi, ProviderError};
    use crate::server::webhook_router;
    use crate::testing::fixtures::{credential, payment_event};
    use crate::testing::helpers::test_config;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn post(api: MockProviderApi, store: Arc<MemoryCredentialStore>, body: &str) -> (StatusCode, Value) {
        let context = AppContext::new(Arc::new(test_config()), Arc::new(api), store).unwrap();
        let response = webhook_router(context)
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

    #[tokio::test]
    async fn test_invalid_json_is_400() {
        let (status, body) = post(MockProviderApi::new(), Arc::default(), "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"message": "No JSON received"}));
    }

    #[tokio::test]
    async fn test_empty_object_is_400() {
        let (status, _) = post(MockProviderApi::new(), Arc::default(), "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_fields_is_500() {
        let (status, body) =
            post(MockProviderApi::new(), Arc::default(), r#"{"type":"payment.created"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({"message": "Internal error"}));
    }

    #[tokio::test]
    async fn test_failed_enrichment_still_acknowledged() {
        let mut api = MockProviderApi::new();
        api.expect_retrieve_merchant()
            .times(1)
            .returning(|_| Err(ProviderError::Timeout { seconds: 10 }));
        api.expect_list_locations()
            .times(1)
            .returning(|_| Err(ProviderError::Timeout { seconds: 10 }));
        let store = Arc::new(MemoryCredentialStore::new());
        store.set("L1", credential("M1", "EAAA-l1")).await.unwrap();

        let (status, body) = post(api, store, &payment_event("evt-1", "L1").to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"message": "Webhook processed"}));
    }
}
