//! Rangehost Core Library
//!
//! 最小化的 HTTP 文件服务器：上传文件到存储目录，下载时支持 `Range` 断点续传。
//!
//! # 模块
//!
//! - **config**: 存储目录、监听地址等启动参数
//! - **storage**: 存储目录句柄、文件名安全检查、文件元数据
//! - **transfer**: 范围解析、分块下载、上传接收、HTTP 路由
//! - **error**: 错误类型及其 HTTP 映射
//!
//! # 使用示例
//!
//! ```no_run
//! use rangehost_core::{DownloadEngine, ServeError, Storage};
//!
//! # async fn resume() -> Result<(), ServeError> {
//! let storage = Storage::open("static").await?;
//! let engine = DownloadEngine::new(storage);
//!
//! // 从第 5 个字节开始续传
//! let desc = engine.resolve_and_stream("a.txt", "bytes=5-").await?;
//! assert_eq!(desc.status.as_u16(), 206);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod storage;
pub mod transfer;

pub use config::ServerConfig;
pub use error::ServeError;
pub use storage::{Storage, StoredFile};

// Transfer re-exports
pub use transfer::{
    AppState, ChunkStream, DownloadEngine, RangeSpec, ResolvedRange, StreamDescriptor,
    UploadReceiver, UploadResponse, router, start_http_server,
};
