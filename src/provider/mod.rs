//! Provider capability module。
//!
//! - `types`：Square 请求/响应模型与运行环境
//! - `error`：提供商调用错误
//! - `traits`：出站 API 接口，测试中可替换
//! - `client`：基于 reqwest 的 Square 客户端
//! - `merchant_data`：商户与门店查询

mod client;
mod error;
mod merchant_data;
mod traits;
mod types;

pub use client::SquareClient;
pub use error::{ProviderError, ProviderResult};
pub use merchant_data::{LocationInfo, MerchantData};
#[cfg(test)]
pub use traits::MockProviderApi;
pub use traits::ProviderApi;
pub use types::{ApiError, Environment, Location, Merchant, TokenGrant, TokenRequest, TokenResult};
