//! # 配置管理器
//!
//! 默认值 → TOML 配置文件 → `.env` → 环境变量覆盖

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::AppConfig;
use crate::error::{AppError, Result};
use crate::provider::Environment;

/// 显式指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "MERCHANT_OAUTH_CONFIG_PATH";

/// 通用覆盖前缀，段之间用双下划线分隔
///
/// 例如 `MERCHANT_OAUTH_PROVIDER__TIMEOUT_SECONDS` -> `provider.timeout_seconds`
const OVERRIDE_PREFIX: &str = "MERCHANT_OAUTH_";

/// 沿用示例部署中约定俗成的变量名
const WELL_KNOWN_VARS: &[(&str, &str)] = &[
    ("SQ_ENVIRONMENT", "provider.environment"),
    ("SQ_APPLICATION_ID", "provider.application_id"),
    ("SQ_APPLICATION_SECRET", "provider.application_secret"),
    ("PUBLIC_DOMAIN", "oauth.public_domain"),
    ("OAUTH_PORT", "dual_port.oauth.port"),
    ("WEBHOOK_PORT", "dual_port.webhook.port"),
];

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 当前配置
    config: Arc<AppConfig>,
    /// 配置文件来源（未使用文件时为 None）
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// 创建配置管理器
    ///
    /// 优先使用显式路径，其次 `MERCHANT_OAUTH_CONFIG_PATH`，再次
    /// `config/config.{RUST_ENV}.toml`（存在时），都没有则只用默认值。
    pub fn new(explicit_path: Option<&Path>) -> Result<Self> {
        if let Ok(path) = dotenv::dotenv() {
            debug!("已加载 .env 文件: {:?}", path);
        }

        let config_file = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
            .or_else(|| {
                let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
                let candidate = PathBuf::from(format!("config/config.{env}.toml"));
                candidate.exists().then_some(candidate)
            });

        let config = match &config_file {
            Some(path) => Self::load_config_file(path)?,
            None => {
                info!("未找到配置文件，使用默认配置");
                AppConfig::default()
            }
        };

        let mut manager = Self::from_parts(config, utf8_vars(env::vars_os()))?;
        manager.source = config_file;
        Ok(manager)
    }

    /// 从指定文件创建配置管理器（不读取环境变量）
    pub fn from_file(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config = Self::load_config_file(config_path)?;
        Ok(Self {
            config: Arc::new(config),
            source: Some(config_path.to_path_buf()),
        })
    }

    /// 在已有配置上应用给定的变量集合
    pub fn from_parts(
        mut config: AppConfig,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self> {
        let overrides = Self::build_env_overrides(vars);
        Self::apply_env_overrides(&mut config, &overrides)?;

        info!("配置管理器初始化完成");
        info!("- 环境: {}", config.provider.environment);
        info!("- 环境变量覆盖: {} 个", overrides.len());

        Ok(Self {
            config: Arc::new(config),
            source: None,
        })
    }

    /// 获取当前配置
    #[must_use]
    pub fn config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    /// 配置文件来源
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 加载配置文件
    fn load_config_file(path: &Path) -> Result<AppConfig> {
        crate::ensure_config!(path.exists(), "配置文件不存在: {}", path.display());

        let config_content = std::fs::read_to_string(path).map_err(|e| {
            AppError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
        })?;

        toml::from_str(&config_content).map_err(|e| {
            AppError::config_with_source(
                format!("TOML解析失败 - 配置文件: {}, 详细错误: {e}", path.display()),
                e,
            )
        })
    }

    /// 构建环境变量覆盖映射
    fn build_env_overrides(
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> BTreeMap<String, String> {
        let mut overrides = BTreeMap::new();

        for (key, value) in vars {
            if let Some((_, path)) = WELL_KNOWN_VARS.iter().find(|(name, _)| *name == key) {
                overrides.insert((*path).to_string(), value);
                continue;
            }
            if key == CONFIG_PATH_ENV {
                continue;
            }
            if let Some(config_key) = key.strip_prefix(OVERRIDE_PREFIX) {
                let config_path = config_key.to_lowercase().replace("__", ".");
                overrides.insert(config_path, value);
            }
        }

        debug!("发现 {} 个环境变量覆盖", overrides.len());
        overrides
    }

    /// 应用环境变量覆盖
    fn apply_env_overrides(
        config: &mut AppConfig,
        overrides: &BTreeMap<String, String>,
    ) -> Result<()> {
        for (path, value) in overrides {
            debug!(
                "应用环境变量覆盖: {} = {}",
                path,
                if path.contains("secret") {
                    "***"
                } else {
                    value
                }
            );

            Self::apply_override_to_config(config, path, value)?;
        }
        Ok(())
    }

    /// 将环境变量覆盖应用到配置对象
    fn apply_override_to_config(config: &mut AppConfig, path: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();

        match parts.as_slice() {
            ["provider", "environment"] => {
                let (environment, recognized) = Environment::parse_lenient(value);
                if !recognized {
                    warn!("未知的运行环境 {:?}，回退到 sandbox", value);
                }
                config.provider.environment = environment;
            }
            ["provider", "application_id"] => config.provider.application_id = value.to_string(),
            ["provider", "application_secret"] => {
                config.provider.application_secret = value.to_string();
            }
            ["provider", "base_url"] => {
                config.provider.base_url = (!value.is_empty()).then(|| value.to_string());
            }
            ["provider", "api_version"] => config.provider.api_version = value.to_string(),
            ["provider", "user_agent_detail"] => {
                config.provider.user_agent_detail = value.to_string();
            }
            ["provider", "timeout_seconds"] => {
                config.provider.timeout_seconds = parse_value(path, value)?;
            }
            ["provider", "scopes"] => {
                config.provider.scopes = value
                    .split([' ', ','])
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            ["oauth", "public_domain"] => config.oauth.public_domain = value.to_string(),
            ["oauth", "verify_state"] => config.oauth.verify_state = parse_value(path, value)?,
            ["oauth", "state_ttl_seconds"] => {
                config.oauth.state_ttl_seconds = parse_value(path, value)?;
            }
            ["dual_port", "oauth", "host"] => config.dual_port.oauth.http.host = value.to_string(),
            ["dual_port", "oauth", "port"] => {
                config.dual_port.oauth.http.port = parse_value(path, value)?;
            }
            ["dual_port", "webhook", "host"] => {
                config.dual_port.webhook.http.host = value.to_string();
            }
            ["dual_port", "webhook", "port"] => {
                config.dual_port.webhook.http.port = parse_value(path, value)?;
            }
            ["webhook", "dedup_ttl_seconds"] => {
                config.webhook.dedup_ttl_seconds = parse_value(path, value)?;
            }
            ["webhook", "dedup_max_entries"] => {
                config.webhook.dedup_max_entries = parse_value(path, value)?;
            }
            _ => {
                warn!("未知的配置路径，忽略环境变量覆盖: {}", path);
            }
        }

        Ok(())
    }
}

/// 丢弃键或值不是合法 UTF-8 的环境变量
fn utf8_vars(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> impl Iterator<Item = (String, String)> {
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

fn parse_value<T>(path: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::config_with_source(format!("无效的配置值 {path}={value}"), e))
}
