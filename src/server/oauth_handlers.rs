//! # 授权服务处理器

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use super::response::error_reply;
use crate::error::Result;
use crate::logging::{LogComponent, LogStage};
use crate::oauth::{AuthorizationRequest, build_authorize_url};
use crate::pages::CallbackPage;
use crate::{linfo, lwarn};

/// 回调查询参数
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub state: Option<String>,
}

/// `GET /`：渲染带授权链接的入口页
pub async fn index(State(state): State<AppState>) -> Response {
    let request_id = Uuid::new_v4().to_string();
    match render_index(&state, &request_id).await {
        Ok(html) => html.into_response(),
        Err(err) => error_reply(&request_id, LogStage::Authorization, &err),
    }
}

async fn render_index(state: &AppState, request_id: &str) -> Result<Html<String>> {
    let provider = &state.config.provider;
    let request = AuthorizationRequest {
        client_id: provider.application_id.clone(),
        redirect_uri: state.config.oauth.redirect_uri(),
        scopes: provider.scopes.clone(),
        state: state.states.issue().await,
    };
    let authorize_url = build_authorize_url(&provider.effective_base_url(), &request)?;

    linfo!(
        request_id,
        LogStage::Authorization,
        LogComponent::OAuth,
        "index",
        &format!("🔗 授权链接: {authorize_url}")
    );

    Ok(Html(state.pages.render_index(&authorize_url)?))
}

/// `GET /callback`：处理提供商回跳，交换授权码
///
/// 所有结果都以 200 页面返回，失败时用户可重新点击授权链接。
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let page = callback_page(&state, &request_id, params).await;
    match state.pages.render_callback(&page) {
        Ok(html) => Html(html).into_response(),
        Err(err) => error_reply(&request_id, LogStage::TokenExchange, &err),
    }
}

async fn callback_page(state: &AppState, request_id: &str, params: CallbackParams) -> CallbackPage {
    if let Some(error) = params.error.as_deref().filter(|e| !e.is_empty()) {
        lwarn!(
            request_id,
            LogStage::TokenExchange,
            LogComponent::OAuth,
            "callback",
            &format!(
                "授权被拒绝: error={error}, description={}",
                params.error_description.as_deref().unwrap_or("-")
            )
        );
        return CallbackPage::provider_denied(error);
    }

    let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
        lwarn!(
            request_id,
            LogStage::TokenExchange,
            LogComponent::OAuth,
            "callback",
            "回调缺少授权码"
        );
        return CallbackPage::missing_code();
    };

    if state.config.oauth.verify_state {
        let valid = match params.state.as_deref() {
            Some(value) if !value.is_empty() => state.states.consume(value).await,
            _ => false,
        };
        if !valid {
            lwarn!(
                request_id,
                LogStage::TokenExchange,
                LogComponent::OAuth,
                "callback",
                "state 缺失、未知或已使用"
            );
            return CallbackPage::invalid_state();
        }
    }

    match state.tokens.exchange_code(request_id, code).await {
        Ok(outcome) => CallbackPage::succeeded(&outcome),
        Err(err) => {
            lwarn!(
                request_id,
                LogStage::TokenExchange,
                LogComponent::OAuth,
                "callback",
                &format!("❌ 令牌交换失败: {err}")
            );
            CallbackPage::exchange_failed(&err)
        }
    }
}
