//! # Webhook 事件处理
//!
//! 按事件中的 `location_id` 查找凭据，然后查询商户与门店信息。
//! 查询失败不影响处理结果，始终向提供商确认收到。

use std::sync::Arc;

use super::dedup::EventDeduplicator;
use super::event::WebhookEvent;
use crate::credentials::CredentialStore;
use crate::error::Result;
use crate::logging::{LogComponent, LogStage};
use crate::oauth::TokenService;
use crate::provider::MerchantData;
use crate::{linfo, lwarn};

/// 补全得到的展示信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub business_name: Option<String>,
    pub location_name: Option<String>,
}

/// 处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// 相同 `event_id` 已处理过
    Duplicate,
    /// 该门店没有已保存的凭据
    NoCredential,
    /// 已处理，补全信息可能为空
    Processed(Enrichment),
}

/// Webhook 事件处理器
pub struct WebhookProcessor {
    store: Arc<dyn CredentialStore>,
    merchant_data: MerchantData,
    tokens: Arc<TokenService>,
    dedup: EventDeduplicator,
}

impl WebhookProcessor {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        merchant_data: MerchantData,
        tokens: Arc<TokenService>,
        dedup: EventDeduplicator,
    ) -> Self {
        Self {
            store,
            merchant_data,
            tokens,
            dedup,
        }
    }

    pub async fn process(&self, request_id: &str, event: &WebhookEvent) -> Result<WebhookOutcome> {
        let payment = event.payment();
        linfo!(
            request_id,
            LogStage::Webhook,
            LogComponent::Webhook,
            "receive",
            &format!(
                "📨 Received webhook: {}, payment_id={}, location_id={}, amount={} {}",
                event.event_type,
                payment.id,
                payment.location_id,
                payment.amount_money.amount,
                payment.amount_money.currency
            )
        );

        if let Some(event_id) = event.event_id.as_deref() {
            if !self.dedup.claim(event_id).await {
                linfo!(
                    request_id,
                    LogStage::Webhook,
                    LogComponent::Webhook,
                    "duplicate",
                    &format!("重复投递，已忽略: event_id={event_id}")
                );
                return Ok(WebhookOutcome::Duplicate);
            }
        }

        let result = self.process_claimed(request_id, event).await;
        if result.is_err() {
            if let Some(event_id) = event.event_id.as_deref() {
                self.dedup.release(event_id).await;
            }
        }
        result
    }

    async fn process_claimed(
        &self,
        request_id: &str,
        event: &WebhookEvent,
    ) -> Result<WebhookOutcome> {
        let location_id = event.location_id();

        let Some(credential) = self.store.get(location_id).await? else {
            lwarn!(
                request_id,
                LogStage::Webhook,
                LogComponent::CredentialStore,
                "lookup",
                &format!("No stored access token for location_id={location_id}")
            );
            return Ok(WebhookOutcome::NoCredential);
        };

        if let Some(declared) = event.foreign_merchant(&credential.merchant_id) {
            lwarn!(
                request_id,
                LogStage::Webhook,
                LogComponent::CredentialStore,
                "merchant_mismatch",
                &format!(
                    "事件商户 {declared} 与门店 {location_id} 凭据的商户 {} 不一致",
                    credential.merchant_id
                )
            );
        }

        let credential = self
            .tokens
            .ensure_fresh(request_id, location_id, credential)
            .await;
        let token = credential.access_token.as_str();

        let merchant = self.merchant_data.get_merchant_info(token).await;
        let location = self
            .merchant_data
            .get_location_info(token, Some(location_id))
            .await;

        let enrichment = Enrichment {
            business_name: merchant.and_then(|m| m.business_name),
            location_name: location
                .as_ref()
                .and_then(|info| info.single_name())
                .map(str::to_string),
        };

        if let Some(name) = &enrichment.business_name {
            linfo!(
                request_id,
                LogStage::Enrichment,
                LogComponent::Webhook,
                "merchant",
                &format!("Merchant business name: {name}")
            );
        }
        if let Some(name) = &enrichment.location_name {
            linfo!(
                request_id,
                LogStage::Enrichment,
                LogComponent::Webhook,
                "location",
                &format!("Location name: {name}")
            );
        }
        if enrichment == Enrichment::default() {
            lwarn!(
                request_id,
                LogStage::Enrichment,
                LogComponent::Webhook,
                "enrichment_skipped",
                "⚠️ 商户与门店信息均未获取，事件仍按已处理确认"
            );
        }

        Ok(WebhookOutcome::Processed(enrichment))
    }
}
