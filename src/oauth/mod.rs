//! # OAuth 授权模块
//!
//! - `authorize`：授权链接构建与解析
//! - `state`：防伪造 state 的签发与消费
//! - `token_service`：授权码交换与令牌刷新

mod authorize;
mod state;
mod token_service;

pub use authorize::{AUTHORIZE_PATH, AuthorizationRequest, build_authorize_url, parse_authorize_url};
pub use state::StateStore;
pub use token_service::{ExchangeOutcome, TokenService};
