//! 服务配置
//!
//! 没有配置文件，存储目录和监听地址由守护进程通过命令行参数或环境变量传入。

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// 默认存储目录（相对于工作目录）
pub const DEFAULT_STORAGE_ROOT: &str = "static";
/// 默认监听端口
pub const DEFAULT_PORT: u16 = 8111;
/// 默认监听地址
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// 静态文件挂载前缀
pub const DEFAULT_STATIC_PREFIX: &str = "/static";

/// 服务器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 上传/下载文件所在目录
    pub storage_root: PathBuf,
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 静态文件路由前缀，必须以 `/` 开头
    pub static_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            static_prefix: DEFAULT_STATIC_PREFIX.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn new(storage_root: impl Into<PathBuf>, host: impl Into<String>, port: u16) -> Self {
        Self {
            storage_root: storage_root.into(),
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// 解析监听地址
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }
}
