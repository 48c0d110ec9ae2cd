use async_trait::async_trait;

use super::error::ProviderResult;
use super::types::{Location, Merchant, TokenRequest, TokenResult};

/// 出站提供商 API 的最小接口
///
/// 授权服务与 Webhook 服务只通过此接口访问提供商，测试中可直接替换为 mock。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderApi: Send + Sync {
    /// `POST /oauth2/token`
    async fn obtain_token(&self, request: &TokenRequest) -> ProviderResult<TokenResult>;

    /// `GET /v2/merchants/me`
    async fn retrieve_merchant(&self, access_token: &str) -> ProviderResult<Merchant>;

    /// `GET /v2/locations`
    async fn list_locations(&self, access_token: &str) -> ProviderResult<Vec<Location>>;
}
