//! # JSON 响应

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::lerror;
use crate::logging::{LogComponent, LogStage};

/// Webhook 返回的固定文案
pub mod messages {
    pub const NO_JSON: &str = "No JSON received";
    pub const INTERNAL_ERROR: &str = "Internal error";
    pub const NO_TOKEN: &str = "No access token found for location_id";
    pub const PROCESSED: &str = "Webhook processed";
    pub const DUPLICATE: &str = "Webhook already processed";
}

/// `{"message": ...}` 响应体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    /// 生成带状态码的响应
    pub fn reply(status: StatusCode, message: &str) -> Response {
        (
            status,
            Json(Self {
                message: message.to_string(),
            }),
        )
            .into_response()
    }
}

/// 处理器边界上的错误响应
///
/// 到达这里的都是输入异常或内部故障，按错误级别记录；5xx 不向调用方暴露细节。
pub fn error_reply(request_id: &str, stage: LogStage, error: &AppError) -> Response {
    let (status, code) = error.to_http_response_parts();
    lerror!(
        request_id,
        stage,
        LogComponent::ServerSetup,
        "handler_error",
        &format!("❌ 请求处理失败 [{code}]: {error}")
    );
    let message = if status.is_server_error() {
        messages::INTERNAL_ERROR
    } else {
        code
    };
    MessageResponse::reply(status, message)
}
