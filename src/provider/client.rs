//! # Square HTTP 客户端
//!
//! 基于 reqwest 的 `ProviderApi` 实现，运行环境在构造时确定

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::error::{ProviderError, ProviderResult};
use super::traits::ProviderApi;
use super::types::{ApiError, Location, Merchant, TokenRequest, TokenResult};
use crate::config::ProviderConfig;
use crate::error::{AppError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lwarn};

/// 错误响应体。新版接口返回 `errors` 数组，OAuth 旧接口返回 `message`/`type`
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ApiError>,
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MerchantEnvelope {
    merchant: Merchant,
}

#[derive(Debug, Deserialize)]
struct LocationsEnvelope {
    #[serde(default)]
    locations: Vec<Location>,
}

/// Square API 客户端
#[derive(Debug, Clone)]
pub struct SquareClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout_seconds: u64,
}

impl SquareClient {
    /// 根据提供商配置创建客户端
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "Square-Version",
            HeaderValue::from_str(&config.api_version).map_err(|e| {
                AppError::config_with_source(
                    format!("无效的 api_version: {}", config.api_version),
                    e,
                )
            })?,
        );

        let user_agent = format!(
            "{}/{} {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            config.user_agent_detail
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(user_agent.trim())
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::config_with_source("HTTP客户端创建失败", e))?;

        Ok(Self {
            http_client,
            base_url: config.effective_base_url(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// API 基础地址
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn map_transport_error(&self, err: &reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout {
                seconds: self.timeout_seconds,
            }
        } else {
            ProviderError::Network(err.to_string())
        }
    }

    /// 发送请求并按状态码解析成功体或错误体
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> ProviderResult<T> {
        let response = request.send().await.map_err(|e| {
            let err = self.map_transport_error(&e);
            lwarn!(
                "system",
                LogStage::Upstream,
                LogComponent::ProviderClient,
                operation,
                &format!("请求失败: {err}")
            );
            err
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(&e))?;

        ldebug!(
            "system",
            LogStage::Upstream,
            LogComponent::ProviderClient,
            operation,
            &format!("HTTP {} ({} bytes)", status.as_u16(), body.len())
        );

        if status.is_success() {
            serde_json::from_slice(&body).map_err(|e| ProviderError::Decode(e.to_string()))
        } else {
            Err(ProviderError::Api {
                status: status.as_u16(),
                errors: parse_error_body(status.as_u16(), &body),
            })
        }
    }
}

/// 将各种形态的错误体统一为 `ApiError` 列表
fn parse_error_body(status: u16, body: &[u8]) -> Vec<ApiError> {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();

    if !parsed.errors.is_empty() {
        return parsed.errors;
    }

    if parsed.message.is_some() || parsed.kind.is_some() {
        return vec![ApiError {
            category: "OAUTH_ERROR".to_string(),
            code: parsed
                .kind
                .unwrap_or_else(|| "UNKNOWN".to_string())
                .to_uppercase(),
            detail: parsed.message,
            field: None,
        }];
    }

    let text = String::from_utf8_lossy(body);
    let detail: String = text.chars().take(200).collect();
    vec![ApiError {
        category: "API_ERROR".to_string(),
        code: format!("HTTP_{status}"),
        detail: (!detail.is_empty()).then_some(detail),
        field: None,
    }]
}

#[async_trait]
impl ProviderApi for SquareClient {
    async fn obtain_token(&self, request: &TokenRequest) -> ProviderResult<TokenResult> {
        let builder = self
            .http_client
            .post(self.endpoint("/oauth2/token"))
            .json(request);
        self.send("obtain_token", builder).await
    }

    async fn retrieve_merchant(&self, access_token: &str) -> ProviderResult<Merchant> {
        let builder = self
            .http_client
            .get(self.endpoint("/v2/merchants/me"))
            .bearer_auth(access_token);
        let envelope: MerchantEnvelope = self.send("retrieve_merchant", builder).await?;
        Ok(envelope.merchant)
    }

    async fn list_locations(&self, access_token: &str) -> ProviderResult<Vec<Location>> {
        let builder = self
            .http_client
            .get(self.endpoint("/v2/locations"))
            .bearer_auth(access_token);
        let envelope: LocationsEnvelope = self.send("list_locations", builder).await?;
        Ok(envelope.locations)
    }
}
