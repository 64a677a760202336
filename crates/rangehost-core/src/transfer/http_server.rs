//! HTTP 服务器
//!
//! # 路由
//!
//! - `POST /upload` 上传文件（multipart 字段 `file`）
//! - `GET /hello` 健康检查
//! - `GET /download/{file_name}` 支持 `Range` 的分块下载
//! - `GET /static/...` 只读静态文件，与下载共用存储目录
//!
//! CORS 完全放开：任意来源、方法和请求头，允许携带凭据。

use crate::config::ServerConfig;
use crate::error::ServeError;
use crate::storage::Storage;
use crate::transfer::download::{DownloadEngine, StreamDescriptor};
use crate::transfer::upload::UploadReceiver;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderMap, header},
    routing::{get, post},
};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// 上传表单中文件字段的名称
pub const UPLOAD_FIELD: &str = "file";

/// `POST /upload` 的响应体
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    pub filename: String,
}

/// 请求处理器共享状态，启动时构建一次
pub struct AppState {
    pub storage: Storage,
    pub downloads: DownloadEngine,
    pub uploads: UploadReceiver,
}

impl AppState {
    pub fn new(storage: Storage) -> Self {
        Self {
            downloads: DownloadEngine::new(storage.clone()),
            uploads: UploadReceiver::new(storage.clone()),
            storage,
        }
    }
}

/// 构建路由
pub fn router(state: Arc<AppState>, static_prefix: &str) -> Router {
    let static_files = ServeDir::new(state.storage.root());

    Router::new()
        .route(
            "/upload",
            post(handle_upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/hello", get(handle_hello))
        .route("/download/:file_name", get(handle_download))
        .nest_service(static_prefix, static_files)
        .with_state(state)
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}

/// 启动服务器，`shutdown` 完成后停止接受新连接并等待进行中的响应结束
pub async fn start_http_server<F>(config: ServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let storage = Storage::open(&config.storage_root).await?;
    let state = Arc::new(AppState::new(storage));
    info!("Serving files from {:?}", state.storage.root());

    let app = router(state, &config.static_prefix);

    let listener = TcpListener::bind(config.bind_addr()?).await?;
    info!("HTTP Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP Server stopped");
    Ok(())
}

async fn handle_hello() -> Json<Value> {
    Json(json!({ "hello": "world" }))
}

async fn handle_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServeError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServeError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ServeError::BadRequest("Missing filename".to_string()))?;

        let filename = state.uploads.receive(&filename, field).await?;
        return Ok(Json(UploadResponse { filename }));
    }

    Err(ServeError::BadRequest(format!(
        "Missing form field '{UPLOAD_FIELD}'"
    )))
}

async fn handle_download(
    Path(file_name): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StreamDescriptor, ServeError> {
    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    state.downloads.resolve_and_stream(&file_name, range).await
}
