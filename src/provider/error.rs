//! 提供商调用错误
//!
//! 对应提供商 SDK 的 `(is_success, body | errors)` 二元结果中的失败一侧

use super::types::ApiError;
use thiserror::Error;

/// 提供商调用错误类型
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// 提供商拒绝了请求
    #[error("provider rejected request (HTTP {status}): {}", format_errors(.errors))]
    Api { status: u16, errors: Vec<ApiError> },

    /// 上游超时
    #[error("upstream timeout after {seconds}s")]
    Timeout { seconds: u64 },

    /// 网络错误
    #[error("network error: {0}")]
    Network(String),

    /// 响应体无法解析
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ProviderError {
    /// 是否为超时
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// 提供商返回的错误列表
    #[must_use]
    pub fn errors(&self) -> &[ApiError] {
        match self {
            Self::Api { errors, .. } => errors,
            _ => &[],
        }
    }
}

fn format_errors(errors: &[ApiError]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// 提供商调用结果
pub type ProviderResult<T> = Result<T, ProviderError>;
