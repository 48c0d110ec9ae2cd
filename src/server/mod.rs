//! # HTTP 服务
//!
//! 授权服务与 Webhook 服务各自一个 axum 路由，可同进程运行也可单独部署

mod oauth_handlers;
mod response;
mod webhook_handlers;

pub use response::{MessageResponse, messages};

use axum::Router;
use axum::routing::{get, post};
use std::ops::Deref;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::app::AppContext;

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    context: Arc<AppContext>,
}

impl AppState {
    #[must_use]
    pub const fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }
}

impl Deref for AppState {
    type Target = AppContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

/// 授权服务路由：`GET /`、`GET /callback`
pub fn oauth_router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(oauth_handlers::index))
        .route("/callback", get(oauth_handlers::callback))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(AppState::new(context))
}

/// Webhook 服务路由：`POST /webhook`
pub fn webhook_router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handlers::receive))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(AppState::new(context))
}
