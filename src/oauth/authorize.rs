//! 授权链接构建与解析

use url::Url;

use crate::error::{Context, Result};

/// 授权路径
pub const AUTHORIZE_PATH: &str = "/oauth2/authorize";

/// 一次页面访问生成的授权请求，不持久化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub state: String,
}

impl AuthorizationRequest {
    /// 空格拼接的权限范围
    #[must_use]
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }
}

/// 构建 `{base}/oauth2/authorize?client_id=..&redirect_uri=..&scope=..&state=..`
pub fn build_authorize_url(base_url: &str, request: &AuthorizationRequest) -> Result<String> {
    let endpoint = format!("{}{AUTHORIZE_PATH}", base_url.trim_end_matches('/'));
    let mut url =
        Url::parse(&endpoint).with_context(|| format!("Invalid authorize URL: {endpoint}"))?;

    url.query_pairs_mut()
        .append_pair("client_id", &request.client_id)
        .append_pair("redirect_uri", &request.redirect_uri)
        .append_pair("scope", &request.scope())
        .append_pair("state", &request.state);

    Ok(url.into())
}

/// 从授权链接中解析出授权请求
pub fn parse_authorize_url(authorize_url: &str) -> Result<AuthorizationRequest> {
    let url = Url::parse(authorize_url)
        .with_context(|| format!("Invalid authorize URL: {authorize_url}"))?;

    let mut request = AuthorizationRequest {
        client_id: String::new(),
        redirect_uri: String::new(),
        scopes: Vec::new(),
        state: String::new(),
    };

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "client_id" => request.client_id = value.into_owned(),
            "redirect_uri" => request.redirect_uri = value.into_owned(),
            "scope" => {
                request.scopes = value
                    .split(' ')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "state" => request.state = value.into_owned(),
            _ => {}
        }
    }

    Ok(request)
}
