//! # 日志配置模块
//!
//! 提供统一的日志初始化以及带阶段/组件标签的结构化日志宏

use std::env;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 请求处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    /// 服务启动
    Startup,
    /// 服务关闭
    Shutdown,
    /// 配置加载
    Configuration,
    /// 授权链接生成
    Authorization,
    /// 授权回调与令牌交换
    TokenExchange,
    /// 令牌刷新
    TokenRefresh,
    /// Webhook 接收
    Webhook,
    /// 商户数据补全
    Enrichment,
    /// 上游调用
    Upstream,
}

impl LogStage {
    /// 日志中使用的标签
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Configuration => "configuration",
            Self::Authorization => "authorization",
            Self::TokenExchange => "token_exchange",
            Self::TokenRefresh => "token_refresh",
            Self::Webhook => "webhook",
            Self::Enrichment => "enrichment",
            Self::Upstream => "upstream",
        }
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    /// 主程序
    Main,
    /// 服务器装配
    ServerSetup,
    /// 配置管理器
    Config,
    /// OAuth 授权服务
    OAuth,
    /// Webhook 服务
    Webhook,
    /// 提供商 HTTP 客户端
    ProviderClient,
    /// 商户数据查询
    MerchantData,
    /// 凭据存储
    CredentialStore,
}

impl LogComponent {
    /// 日志中使用的标签
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::ServerSetup => "server_setup",
            Self::Config => "config",
            Self::OAuth => "oauth",
            Self::Webhook => "webhook",
            Self::ProviderClient => "provider_client",
            Self::MerchantData => "merchant_data",
            Self::CredentialStore => "credential_store",
        }
    }
}

/// 结构化 INFO 日志
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            component = $component.as_str(),
            operation = %$operation,
            "{}",
            $message
        )
    };
}

/// 结构化 DEBUG 日志
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            component = $component.as_str(),
            operation = %$operation,
            "{}",
            $message
        )
    };
}

/// 结构化 WARN 日志
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            component = $component.as_str(),
            operation = %$operation,
            "{}",
            $message
        )
    };
}

/// 结构化 ERROR 日志
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            component = $component.as_str(),
            operation = %$operation,
            "{}",
            $message
        )
    };
}

/// 遮蔽令牌等敏感值，只保留前几个字符
#[must_use]
pub fn mask_secret(value: &str) -> String {
    const VISIBLE: usize = 6;
    if value.chars().count() <= VISIBLE {
        return "***".to_string();
    }
    let prefix: String = value.chars().take(VISIBLE).collect();
    format!("{prefix}***")
}

/// 构建默认过滤规则
#[must_use]
pub fn default_filter(log_level: Option<&str>) -> String {
    let level = log_level.unwrap_or("info");
    format!("{level},merchant_oauth=debug,hyper=warn,reqwest=warn,tower_http=info")
}

/// 初始化日志系统
///
/// `RUST_LOG` 优先，其次使用命令行传入的级别。
pub fn init_logging(log_level: Option<&str>) {
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_filter(log_level));

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
