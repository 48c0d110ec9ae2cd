//! 应用上下文（DI 容器）
//!
//! 统一持有两个服务共享的组件，便于在测试中注入替身实现。

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::credentials::{CredentialStore, MemoryCredentialStore};
use crate::error::Result;
use crate::oauth::{StateStore, TokenService};
use crate::pages::Pages;
use crate::provider::{MerchantData, ProviderApi, SquareClient};
use crate::webhook::{EventDeduplicator, WebhookProcessor};

pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub api: Arc<dyn ProviderApi>,
    pub store: Arc<dyn CredentialStore>,
    pub merchant_data: MerchantData,
    pub tokens: Arc<TokenService>,
    pub states: StateStore,
    pub webhooks: WebhookProcessor,
    pub pages: Pages,
}

impl AppContext {
    /// 使用 Square 客户端与内存凭据存储装配
    pub fn bootstrap(config: Arc<AppConfig>) -> Result<Arc<Self>> {
        let api: Arc<dyn ProviderApi> = Arc::new(SquareClient::new(&config.provider)?);
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        Self::new(config, api, store)
    }

    pub fn new(
        config: Arc<AppConfig>,
        api: Arc<dyn ProviderApi>,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Arc<Self>> {
        let merchant_data = MerchantData::new(Arc::clone(&api));
        let tokens = Arc::new(TokenService::new(
            Arc::clone(&api),
            Arc::clone(&store),
            config.provider.application_id.clone(),
            config.provider.application_secret.clone(),
        ));
        let states = StateStore::new(Duration::from_secs(config.oauth.state_ttl_seconds));
        let webhooks = WebhookProcessor::new(
            Arc::clone(&store),
            merchant_data.clone(),
            Arc::clone(&tokens),
            EventDeduplicator::new(&config.webhook),
        );

        Ok(Arc::new(Self {
            config,
            api,
            store,
            merchant_data,
            tokens,
            states,
            webhooks,
            pages: Pages::new()?,
        }))
    }
}
