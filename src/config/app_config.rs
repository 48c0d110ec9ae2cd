//! # 应用配置结构定义

use super::dual_port_config::DualPortServerConfig;
use crate::provider::Environment;
use serde::{Deserialize, Serialize};

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 提供商配置
    #[serde(default)]
    pub provider: ProviderConfig,
    /// 双端口服务器配置
    #[serde(default)]
    pub dual_port: DualPortServerConfig,
    /// 授权服务配置
    #[serde(default)]
    pub oauth: OAuthConfig,
    /// Webhook 服务配置
    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// 提供商配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// 运行环境
    pub environment: Environment,
    /// 应用 ID（OAuth client_id）
    pub application_id: String,
    /// 应用密钥（OAuth client_secret）
    pub application_secret: String,
    /// 覆盖环境默认的 API 地址
    pub base_url: Option<String>,
    /// `Square-Version` 请求头
    pub api_version: String,
    /// 追加到 User-Agent 的说明
    pub user_agent_detail: String,
    /// 出站请求超时（秒）
    pub timeout_seconds: u64,
    /// 申请的权限范围
    pub scopes: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Sandbox,
            application_id: String::new(),
            application_secret: String::new(),
            base_url: None,
            api_version: "2024-01-18".to_string(),
            user_agent_detail: "merchant_oauth_sample".to_string(),
            timeout_seconds: 10,
            scopes: vec![
                "MERCHANT_PROFILE_READ".to_string(),
                "PAYMENTS_READ".to_string(),
            ],
        }
    }
}

impl ProviderConfig {
    /// 实际使用的 API 基础地址
    #[must_use]
    pub fn effective_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map_or_else(
                || self.environment.base_url().to_string(),
                |url| url.trim_end_matches('/').to_string(),
            )
    }
}

/// 授权服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// 对外公开的域名，用于构造回调地址
    pub public_domain: String,
    /// 是否校验回调中的 state
    pub verify_state: bool,
    /// state 有效期（秒）
    pub state_ttl_seconds: u64,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            public_domain: String::new(),
            verify_state: true,
            state_ttl_seconds: 600,
        }
    }
}

impl OAuthConfig {
    /// 回调地址：`{public_domain}/callback`
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        let domain = self.public_domain.trim().trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            format!("{domain}/callback")
        } else {
            format!("https://{domain}/callback")
        }
    }
}

/// Webhook 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// 已处理事件的记忆时长（秒）
    pub dedup_ttl_seconds: u64,
    /// 最多记忆的事件数
    pub dedup_max_entries: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            dedup_ttl_seconds: 86_400,
            dedup_max_entries: 10_000,
        }
    }
}

/// 本进程要运行的服务
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceSelection {
    /// 授权服务与 Webhook 服务同进程运行
    Both,
    /// 仅授权服务
    OAuthOnly,
    /// 仅 Webhook 服务
    WebhookOnly,
}

impl ServiceSelection {
    /// 是否运行授权服务
    #[must_use]
    pub const fn runs_oauth(self) -> bool {
        matches!(self, Self::Both | Self::OAuthOnly)
    }

    /// 是否运行 Webhook 服务
    #[must_use]
    pub const fn runs_webhook(self) -> bool {
        matches!(self, Self::Both | Self::WebhookOnly)
    }
}

impl AppConfig {
    /// 验证配置的有效性
    pub fn validate(&self, services: ServiceSelection) -> Result<(), String> {
        if self.provider.application_id.trim().is_empty() {
            return Err("provider.application_id (SQ_APPLICATION_ID) must be set".to_string());
        }
        if self.provider.application_secret.trim().is_empty() {
            return Err(
                "provider.application_secret (SQ_APPLICATION_SECRET) must be set".to_string(),
            );
        }
        if self.provider.timeout_seconds == 0 {
            return Err("provider.timeout_seconds must be greater than 0".to_string());
        }
        if let Some(base_url) = &self.provider.base_url {
            url::Url::parse(base_url)
                .map_err(|e| format!("provider.base_url is not a valid URL: {e}"))?;
        }

        if services.runs_oauth() {
            if self.oauth.public_domain.trim().is_empty() {
                return Err("oauth.public_domain (PUBLIC_DOMAIN) must be set".to_string());
            }
            if self.oauth.state_ttl_seconds == 0 {
                return Err("oauth.state_ttl_seconds must be greater than 0".to_string());
            }
        }

        self.dual_port
            .validate(services == ServiceSelection::Both)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.provider.application_id = "sq0idp-app".to_string();
        config.provider.application_secret = "sq0csp-secret".to_string();
        config.oauth.public_domain = "https://merchant.example.com".to_string();
        config
    }

    #[rstest]
    #[case("https://merchant.example.com", "https://merchant.example.com/callback")]
    #[case("https://merchant.example.com/", "https://merchant.example.com/callback")]
    #[case("merchant.example.com", "https://merchant.example.com/callback")]
    #[case("http://localhost:8080", "http://localhost:8080/callback")]
    fn test_redirect_uri(#[case] domain: &str, #[case] expected: &str) {
        let config = OAuthConfig {
            public_domain: domain.to_string(),
            ..OAuthConfig::default()
        };
        assert_eq!(config.redirect_uri(), expected);
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate(ServiceSelection::Both).is_ok());
    }

    #[test]
    fn test_missing_secret_rejected() {
        let mut config = valid_config();
        config.provider.application_secret = String::new();
        let err = config.validate(ServiceSelection::WebhookOnly).unwrap_err();
        assert!(err.contains("SQ_APPLICATION_SECRET"));
    }

    #[test]
    fn test_public_domain_only_required_for_oauth() {
        let mut config = valid_config();
        config.oauth.public_domain = String::new();

        assert!(config.validate(ServiceSelection::WebhookOnly).is_ok());
        assert!(config.validate(ServiceSelection::OAuthOnly).is_err());
    }

    #[test]
    fn test_effective_base_url() {
        let mut config = ProviderConfig::default();
        assert_eq!(
            config.effective_base_url(),
            "https://connect.squareupsandbox.com"
        );

        config.environment = Environment::Production;
        assert_eq!(config.effective_base_url(), "https://connect.squareup.com");

        config.base_url = Some("http://127.0.0.1:9999/".to_string());
        assert_eq!(config.effective_base_url(), "http://127.0.0.1:9999");
    }
}
