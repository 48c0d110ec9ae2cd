use crate::{
    app::AppContext,
    config::{AppConfig, ListenerConfig, ServiceSelection},
    error::{AppError, Result},
    linfo,
    logging::{LogComponent, LogStage},
    server::{oauth_router, webhook_router},
};
use crate::lerror;
use axum::Router;
use std::future::pending;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

type ServerTask = JoinHandle<Result<()>>;

/// 绑定端口并在后台运行路由
async fn spawn_server(name: &'static str, listener: &ListenerConfig, router: Router) -> Result<ServerTask> {
    let addr = listener.bind_address()?;
    let tcp = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::network_with_source(format!("{name} 无法绑定 {addr}"), e))?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::ServerSetup,
        "listen",
        &format!("[INFO] {name} listening on http://{addr}")
    );

    Ok(tokio::spawn(async move {
        axum::serve(tcp, router)
            .await
            .map_err(|e| AppError::network_with_source(format!("{name} 异常退出"), e))
    }))
}

/// 处理 Ctrl+C 信号
async fn handle_ctrl_c_signal() -> String {
    match tokio::signal::ctrl_c().await {
        Ok(()) => "Ctrl+C signal".to_string(),
        Err(e) => {
            lerror!(
                "system",
                LogStage::Shutdown,
                LogComponent::ServerSetup,
                "ctrl_c_error",
                &format!("Failed to listen for Ctrl+C: {e:?}")
            );
            "Ctrl+C handler error".to_string()
        }
    }
}

/// 处理服务器任务退出结果
fn handle_task_result(
    server_name: &str,
    result: std::result::Result<Result<()>, tokio::task::JoinError>,
) -> String {
    match result {
        Ok(Err(e)) => {
            lerror!(
                "system",
                LogStage::Shutdown,
                LogComponent::ServerSetup,
                &format!("{}_error", server_name.to_lowercase().replace(' ', "_")),
                &format!("{server_name} error: {e:?}")
            );
            format!("{server_name} error")
        }
        Err(e) => {
            lerror!(
                "system",
                LogStage::Shutdown,
                LogComponent::ServerSetup,
                &format!("{}_panic", server_name.to_lowercase().replace(' ', "_")),
                &format!("{server_name} panicked: {e:?}")
            );
            format!("{server_name} panic")
        }
        Ok(Ok(())) => format!("{server_name} exit"),
    }
}

/// 等待任务结束；未启动的服务永远挂起
async fn join_optional(task: &mut Option<ServerTask>) -> std::result::Result<Result<()>, tokio::task::JoinError> {
    match task {
        Some(handle) => handle.await,
        None => pending().await,
    }
}

/// 等待关闭信号（Ctrl+C 或任一服务器退出）
async fn await_shutdown_reason(
    oauth_task: &mut Option<ServerTask>,
    webhook_task: &mut Option<ServerTask>,
) -> String {
    tokio::select! {
        reason = handle_ctrl_c_signal() => reason,
        result = join_optional(oauth_task) => handle_task_result("OAuth server", result),
        result = join_optional(webhook_task) => handle_task_result("Webhook server", result),
    }
}

/// 服务器生命周期管理器
///
/// 按所选服务启动授权服务和/或 Webhook 服务，两者共享同一个上下文
pub struct DualPortServerManager {
    app_context: Arc<AppContext>,
    services: ServiceSelection,
}

impl DualPortServerManager {
    #[must_use]
    pub const fn new(app_context: Arc<AppContext>, services: ServiceSelection) -> Self {
        Self {
            app_context,
            services,
        }
    }

    /// 启动所选服务
    pub async fn start_all(&self) -> Result<(Option<ServerTask>, Option<ServerTask>)> {
        let config = &self.app_context.config;

        let oauth_task = if self.services.runs_oauth() {
            let router = oauth_router(Arc::clone(&self.app_context));
            Some(spawn_server("OAuth server", &config.dual_port.oauth.http, router).await?)
        } else {
            None
        };

        let webhook_task = if self.services.runs_webhook() {
            let router = webhook_router(Arc::clone(&self.app_context));
            match spawn_server("Webhook server", &config.dual_port.webhook.http, router).await {
                Ok(task) => Some(task),
                Err(e) => {
                    if let Some(task) = &oauth_task {
                        task.abort();
                    }
                    return Err(e);
                }
            }
        } else {
            None
        };

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "all_components_started",
            "✅ All components started"
        );

        Ok((oauth_task, webhook_task))
    }

    /// 停止仍在运行的服务
    pub async fn shutdown_all(
        &self,
        oauth_task: Option<&ServerTask>,
        webhook_task: Option<&ServerTask>,
        shutdown_reason: &str,
    ) {
        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "shutdown_initiated",
            &format!("🛑 Graceful shutdown: {shutdown_reason}")
        );

        for task in [oauth_task, webhook_task].into_iter().flatten() {
            task.abort();
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }
}

/// 运行服务器
///
/// 1. 装配共享上下文
/// 2. 启动所选服务
/// 3. 等待关闭信号（Ctrl+C 或服务器异常）
/// 4. 执行优雅关闭
pub async fn run_servers(config: Arc<AppConfig>, services: ServiceSelection) -> Result<()> {
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::ServerSetup,
        "start_servers",
        &format!(
            "🚀 Starting servers ({:?}), environment={}",
            services, config.provider.environment
        )
    );

    let app_context = AppContext::bootstrap(config)?;
    let server_manager = DualPortServerManager::new(app_context, services);

    let (mut oauth_task, mut webhook_task) = server_manager.start_all().await?;

    let shutdown_reason = await_shutdown_reason(&mut oauth_task, &mut webhook_task).await;

    server_manager
        .shutdown_all(oauth_task.as_ref(), webhook_task.as_ref(), &shutdown_reason)
        .await;

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::ServerSetup,
        "servers_stopped",
        "👋 All servers stopped. Goodbye!"
    );

    Ok(())
}
