//! # HTML 页面
//!
//! 内联 tera 模板，所有变量自动转义

use serde::Serialize;
use tera::{Context as TeraContext, Tera};

use crate::error::Result;
use crate::oauth::ExchangeOutcome;
use crate::provider::ProviderError;

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Square OAuth Sample</title>
</head>
<body style="font-family: sans-serif;">
    <h1>Square OAuth Sample</h1>
    <p>This page serves a link that merchants click to authorize your application.</p>
    <a href="{{ authorize_url }}"><button>Authorize with Square</button></a>
</body>
</html>
"#;

const CALLBACK_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Square OAuth Callback</title>
</head>
<body style="font-family: sans-serif;">
    <h1>{{ page.title }}</h1>
    <div>
{%- for line in page.lines %}
        <p>{{ line }}</p>
{%- endfor %}
{%- for field in page.fields %}
        <p><strong>{{ field.label }}:</strong> {{ field.value }}</p>
{%- endfor %}
    </div>
</body>
</html>
"#;

/// 回调页上的一行 `标签: 值`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageField {
    pub label: String,
    pub value: String,
}

/// 回调结果页
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackPage {
    pub title: String,
    pub lines: Vec<String>,
    pub fields: Vec<PageField>,
}

impl CallbackPage {
    fn new(title: &str, lines: Vec<String>) -> Self {
        Self {
            title: title.to_string(),
            lines,
            fields: Vec::new(),
        }
    }

    /// 授权失败（提供商报错、缺少授权码、state 无效）
    #[must_use]
    pub fn authorization_failed(message: impl Into<String>) -> Self {
        Self::new("Authorization Failed", vec![message.into()])
    }

    /// 提供商在回调中带回了错误
    #[must_use]
    pub fn provider_denied(error: &str) -> Self {
        Self::authorization_failed(format!("Square returned an error: {error}"))
    }

    #[must_use]
    pub fn missing_code() -> Self {
        Self::authorization_failed("No authorization code provided in callback.")
    }

    #[must_use]
    pub fn invalid_state() -> Self {
        Self::authorization_failed("Invalid or expired state")
    }

    /// 令牌交换成功
    #[must_use]
    pub fn succeeded(outcome: &ExchangeOutcome) -> Self {
        let token = &outcome.token;
        let mut page = Self::new("Authorization Succeeded", vec!["Authorization Succeeded!".to_string()]);
        page.fields = vec![
            field("Access Token", &token.access_token),
            field("Refresh Token", token.refresh_token.as_deref().unwrap_or("")),
            field("Expires At", &token.expires_at.to_rfc3339()),
            field("Merchant ID", &token.merchant_id),
        ];
        if outcome.bound_locations.is_empty() {
            page.lines.push(
                "The token could not be linked to any location; webhooks for this merchant will be ignored."
                    .to_string(),
            );
        } else {
            page.fields.push(field("Locations", &outcome.bound_locations.join(", ")));
        }
        page
    }

    /// 令牌交换失败
    #[must_use]
    pub fn exchange_failed(error: &ProviderError) -> Self {
        let lines = if error.is_timeout() {
            vec!["Upstream timeout".to_string()]
        } else if error.errors().is_empty() {
            vec![format!("Errors: {error}")]
        } else {
            let mut lines = vec!["Errors:".to_string()];
            lines.extend(error.errors().iter().map(ToString::to_string));
            lines
        };
        Self::new("Token Exchange Failed", lines)
    }
}

fn field(label: &str, value: &str) -> PageField {
    PageField {
        label: label.to_string(),
        value: value.to_string(),
    }
}

/// 页面渲染器
pub struct Pages {
    tera: Tera,
}

impl Pages {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("index.html", INDEX_TEMPLATE),
            ("callback.html", CALLBACK_TEMPLATE),
        ])?;
        Ok(Self { tera })
    }

    /// 入口页
    pub fn render_index(&self, authorize_url: &str) -> Result<String> {
        let mut context = TeraContext::new();
        context.insert("authorize_url", authorize_url);
        Ok(self.tera.render("index.html", &context)?)
    }

    /// 回调结果页
    pub fn render_callback(&self, page: &CallbackPage) -> Result<String> {
        let mut context = TeraContext::new();
        context.insert("page", page);
        Ok(self.tera.render("callback.html", &context)?)
    }
}
