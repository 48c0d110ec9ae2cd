//! # Merchant OAuth 主程序
//!
//! 运行授权服务、Webhook 服务，或两者同进程运行

use clap::{Parser, Subcommand};
use merchant_oauth::{
    Result,
    config::{self, ServiceSelection},
    dual_port_setup, lerror, linfo,
    logging::{self, LogComponent, LogStage},
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "merchant-oauth")]
#[command(about = "Square OAuth authorization service and payment webhook receiver")]
struct Cli {
    #[arg(short, long, help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Log level when RUST_LOG is not set (default: info)")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// 同进程运行两个服务（默认）
    Serve,
    /// 只运行授权服务
    Oauth,
    /// 只运行 Webhook 服务
    Webhook,
}

impl From<Command> for ServiceSelection {
    fn from(command: Command) -> Self {
        match command {
            Command::Serve => Self::Both,
            Command::Oauth => Self::OAuthOnly,
            Command::Webhook => Self::WebhookOnly,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    logging::init_logging(cli.log_level.as_deref());

    let services = cli.command.unwrap_or(Command::Serve).into();
    let config = match config::load_config(cli.config.as_deref(), services) {
        Ok(config) => config,
        Err(e) => {
            lerror!(
                "system",
                LogStage::Configuration,
                LogComponent::Main,
                "config_load_failed",
                &format!("配置加载失败: {e}")
            );
            std::process::exit(1);
        }
    };

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "service_starting",
        "服务启动"
    );
    if let Err(e) = dual_port_setup::run_servers(config, services).await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "service_start_failed",
            &format!("服务启动失败: {e:?}")
        );
        std::process::exit(1);
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "服务正常关闭"
    );
    Ok(())
}
