//! 文件传输模块
//!
//! 包含:
//! - `Range` 请求头解析
//! - 范围下载引擎（分块流式读取）
//! - 上传接收
//! - HTTP 服务器路由

pub mod download;
pub mod http_server;
pub mod range;
pub mod upload;

pub use download::{CHUNK_SIZE, ChunkStream, DownloadEngine, StreamDescriptor};
pub use http_server::{AppState, UploadResponse, router, start_http_server};
pub use range::{RangeSpec, ResolvedRange};
pub use upload::UploadReceiver;
