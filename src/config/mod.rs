//! # 配置管理模块
//!
//! 处理应用配置加载、验证和管理

mod app_config;
mod dual_port_config;
mod manager;

pub use app_config::{AppConfig, OAuthConfig, ProviderConfig, ServiceSelection, WebhookConfig};
pub use dual_port_config::{DualPortServerConfig, ListenerConfig, ServicePortConfig};
pub use manager::{CONFIG_PATH_ENV, ConfigManager};

use std::path::Path;

/// 加载并验证配置
pub fn load_config(
    explicit_path: Option<&Path>,
    services: ServiceSelection,
) -> crate::error::Result<std::sync::Arc<AppConfig>> {
    let manager = ConfigManager::new(explicit_path)?;
    let config = manager.config();
    config
        .validate(services)
        .map_err(crate::error::AppError::config)?;
    Ok(config)
}
