//! # 双端口架构配置
//!
//! 授权服务与 Webhook 服务各自独立监听

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// 双端口服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualPortServerConfig {
    /// 授权服务配置
    #[serde(default = "default_oauth_port_config")]
    pub oauth: ServicePortConfig,
    /// Webhook 服务配置
    #[serde(default = "default_webhook_port_config")]
    pub webhook: ServicePortConfig,
}

/// 单个服务的端口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePortConfig {
    /// HTTP 监听配置
    pub http: ListenerConfig,
}

/// 监听器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// 监听主机
    pub host: String,
    /// 监听端口
    pub port: u16,
}

fn default_oauth_port_config() -> ServicePortConfig {
    ServicePortConfig {
        http: ListenerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        },
    }
}

fn default_webhook_port_config() -> ServicePortConfig {
    ServicePortConfig {
        http: ListenerConfig {
            host: "0.0.0.0".to_string(),
            port: 8081,
        },
    }
}

impl Default for DualPortServerConfig {
    fn default() -> Self {
        Self {
            oauth: default_oauth_port_config(),
            webhook: default_webhook_port_config(),
        }
    }
}

impl ListenerConfig {
    /// 获取绑定地址
    pub fn bind_address(&self) -> std::io::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid address '{addr}': {e}"),
            )
        })
    }
}

impl DualPortServerConfig {
    /// 验证配置的有效性
    ///
    /// `both_in_process` 为真时两个服务共用一个进程，端口不能冲突。
    pub fn validate(&self, both_in_process: bool) -> Result<(), String> {
        for (name, listener) in [("oauth", &self.oauth.http), ("webhook", &self.webhook.http)] {
            if listener.port == 0 {
                return Err(format!("{name} port must be greater than 0"));
            }
            listener
                .bind_address()
                .map_err(|e| format!("{name} listener: {e}"))?;
        }

        if both_in_process && self.oauth.http.port == self.webhook.http.port {
            return Err(format!(
                "oauth and webhook services cannot share port {}",
                self.oauth.http.port
            ));
        }

        Ok(())
    }
}
