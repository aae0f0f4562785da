use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

mod wire;

pub use wire::{ApplicationContext, initialize};

/// 应用启动器
pub struct ApplicationBootstrap;

impl ApplicationBootstrap {
    /// 运行应用的主入口点
    pub async fn run(config_path: Option<&str>) -> Result<()> {
        use flare_collab_core::tracing::init_tracing_from_config;
        use flare_collab_core::utils::ServiceHelper;

        // 加载应用配置
        let app_config = ServiceHelper::load_config(config_path.or(Some("config")), true)?;
        init_tracing_from_config(Some(&app_config.logging));

        let service_config = app_config.project_chat_service();
        let address: SocketAddr =
            ServiceHelper::parse_server_addr(app_config, &service_config.runtime)
                .context("invalid project chat server address")?;
        info!(address = %address, "Server address parsed successfully");

        // 使用 Wire 风格的依赖注入构建应用上下文
        let context = self::wire::initialize(app_config).await?;

        Self::run_with_context(context, address).await
    }

    /// 运行服务（带应用上下文）
    pub async fn run_with_context(context: ApplicationContext, address: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("failed to bind {address}"))?;

        info!(
            address = %address,
            port = %address.port(),
            "Project chat HTTP service is listening"
        );

        axum::serve(listener, context.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("project chat HTTP server error")?;

        info!("Project chat service stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received (Ctrl+C)"),
        Err(err) => {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
