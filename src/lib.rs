//! # Merchant OAuth
//!
//! Square 商户授权服务与支付 Webhook 接收服务

pub mod app;
pub mod config;
pub mod credentials;
pub mod dual_port_setup;
pub mod error;
pub mod logging;
pub mod oauth;
pub mod pages;
pub mod provider;
pub mod server;
pub mod webhook;

#[cfg(test)]
pub mod testing;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, Result};
