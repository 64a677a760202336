//! Rangehost Daemon
//!
//! 文件服务器进程，负责：
//! - 读取命令行参数/环境变量
//! - 初始化日志
//! - 启动 HTTP 服务并处理退出信号

use anyhow::Result;
use clap::Parser;
use rangehost_core::ServerConfig;
use rangehost_core::config::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_STATIC_PREFIX, DEFAULT_STORAGE_ROOT,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rangehost-daemon", version, about = "支持断点续传的 HTTP 文件服务器")]
struct Args {
    /// 存储目录 (不存在时自动创建)
    #[arg(short, long, env = "RANGEHOST_ROOT", default_value = DEFAULT_STORAGE_ROOT)]
    root: PathBuf,
    /// 监听地址
    #[arg(long, env = "RANGEHOST_HOST", default_value = DEFAULT_HOST)]
    host: String,
    /// 监听端口
    #[arg(short, long, env = "RANGEHOST_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    /// 静态文件路由前缀
    #[arg(long, default_value = DEFAULT_STATIC_PREFIX)]
    static_prefix: String,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            storage_root: args.root,
            host: args.host,
            port: args.port,
            static_prefix: args.static_prefix,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 桥接 log crate（rangehost-core 使用）到 tracing
    let _ = tracing_log::LogTracer::init();

    // 初始化日志
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,rangehost_core=debug,tower_http=info")),
        )
        .try_init();

    let config = ServerConfig::from(Args::parse());
    tracing::info!(
        "Rangehost Daemon starting (root={:?}, {}:{})...",
        config.storage_root,
        config.host,
        config.port
    );

    rangehost_core::start_http_server(config, shutdown_signal()).await?;

    tracing::info!("Rangehost Daemon exited");
    Ok(())
}

/// 等待 Ctrl-C 或 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
