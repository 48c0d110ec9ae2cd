//! # 提供商数据类型
//!
//! Square Connect API 的请求/响应模型，只保留本服务实际用到的字段

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Square 运行环境
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// 沙箱环境
    #[default]
    Sandbox,
    /// 生产环境
    Production,
}

impl Environment {
    /// 对应环境的 API 基础地址
    #[must_use]
    pub const fn base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://connect.squareupsandbox.com",
            Self::Production => "https://connect.squareup.com",
        }
    }

    /// 环境名称
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }

    /// 宽松解析：除 `production` 以外的取值一律视为沙箱
    ///
    /// 返回值第二项表示输入是否为可识别的环境名。
    #[must_use]
    pub fn parse_lenient(value: &str) -> (Self, bool) {
        value
            .parse::<Self>()
            .map_or((Self::Sandbox, false), |env| (env, true))
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for Environment {
    /// 与环境变量同样宽松：大小写不敏感，无法识别时回退到沙箱
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        let (environment, recognized) = Self::parse_lenient(&value);
        if !recognized {
            tracing::warn!("未知的运行环境 {:?}，回退到 sandbox", value);
        }
        Ok(environment)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `POST /oauth2/token` 请求体
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct TokenRequest {
    pub client_id: String,
    pub client_secret: String,
    #[serde(flatten)]
    pub grant: TokenGrant,
}

/// 授权类型及其专属字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub enum TokenGrant {
    /// 授权码换取令牌
    AuthorizationCode { code: String },
    /// 刷新令牌
    RefreshToken { refresh_token: String },
}

impl TokenRequest {
    /// 授权码交换请求
    pub fn authorization_code(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            grant: TokenGrant::AuthorizationCode { code: code.into() },
        }
    }

    /// 刷新令牌请求
    pub fn refresh_token(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            grant: TokenGrant::RefreshToken {
                refresh_token: refresh_token.into(),
            },
        }
    }
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grant = match &self.grant {
            TokenGrant::AuthorizationCode { .. } => "authorization_code",
            TokenGrant::RefreshToken { .. } => "refresh_token",
        };
        f.debug_struct("TokenRequest")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("grant_type", &grant)
            .finish()
    }
}

/// 令牌交换结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResult {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub merchant_id: String,
    pub token_type: Option<String>,
}

/// 商户信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: String,
    pub business_name: Option<String>,
    pub country: Option<String>,
    pub language_code: Option<String>,
    pub currency: Option<String>,
    pub status: Option<String>,
    pub main_location_id: Option<String>,
}

/// 门店信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: Option<String>,
    pub merchant_id: Option<String>,
    pub business_name: Option<String>,
    pub status: Option<String>,
    pub timezone: Option<String>,
    pub currency: Option<String>,
}

/// 提供商返回的单条错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub category: String,
    pub code: String,
    pub detail: Option<String>,
    pub field: Option<String>,
}

impl ApiError {
    pub fn new(
        category: impl Into<String>,
        code: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            code: code.into(),
            detail: Some(detail.into()),
            field: None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.code)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {field})")?;
        }
        Ok(())
    }
}
