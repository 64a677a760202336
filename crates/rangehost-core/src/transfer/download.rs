//! 范围下载引擎
//!
//! 解析文件和 `Range` 请求头，生成带正确状态码和响应头的流式响应。
//!
//! # 流程
//!
//! 1. 在存储目录内解析 file_id，读取大小、修改时间、MIME 类型
//! 2. 解析 `Range`，无法识别时按整文件处理
//! 3. 计算 `content-length`（从 `start` 到文件末尾的字节数）
//! 4. 打开文件并定位到 `start`，按 1 MiB 分块惰性读取
//!
//! 读取循环不受 `end` 限制，始终读到文件末尾，因此响应体长度与
//! `content-length` 一致，只有 `content-range` 反映请求的 `end`。

use crate::error::ServeError;
use crate::storage::{Storage, StoredFile};
use crate::transfer::range::ResolvedRange;
use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use log::{debug, info};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::io::{ErrorKind, SeekFrom};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs::File;
use tokio::io::AsyncSeekExt;
use tokio_util::io::ReaderStream;

/// 每次读取的块大小
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// 10000-01-01T00:00:00Z，HTTP-date 的四位年份无法表示此后的时间
const HTTP_DATE_LIMIT_SECS: u64 = 253_402_300_800;

/// 文件名编码时保留的字符，其余全部百分号编码
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// 惰性分块读取文件的字节流
///
/// 持有唯一的文件句柄，流读完或被丢弃（客户端断开）时句柄随之关闭。
pub type ChunkStream = ReaderStream<File>;

/// 下载引擎的输出：状态码、响应头和字节流
pub struct StreamDescriptor {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ChunkStream,
}

impl std::fmt::Debug for StreamDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamDescriptor")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl IntoResponse for StreamDescriptor {
    fn into_response(self) -> Response {
        (self.status, self.headers, Body::from_stream(self.body)).into_response()
    }
}

/// 范围下载引擎
#[derive(Debug, Clone)]
pub struct DownloadEngine {
    storage: Storage,
}

impl DownloadEngine {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// 解析文件和范围，返回流式响应描述
    ///
    /// `range_header` 为 `Range` 请求头原文，没有时传空字符串。
    pub async fn resolve_and_stream(
        &self,
        file_id: &str,
        range_header: &str,
    ) -> Result<StreamDescriptor, ServeError> {
        let file = self.storage.resolve(file_id).await?;
        let range = ResolvedRange::from_header(Some(range_header), file.size);

        let status = if range.is_partial() {
            StatusCode::PARTIAL_CONTENT
        } else {
            StatusCode::OK
        };
        let headers = build_headers(&file, &range)?;

        let body = open_chunks(&file, range.start).await?;

        info!(
            "Download {}: bytes {}-{}/{} -> {}",
            file.name,
            range.start,
            range.end,
            file.size,
            status.as_u16()
        );

        Ok(StreamDescriptor {
            status,
            headers,
            body,
        })
    }
}

/// 打开文件并定位到 `offset`
async fn open_chunks(file: &StoredFile, offset: u64) -> Result<ChunkStream, ServeError> {
    let mut handle = match File::open(&file.path).await {
        Ok(handle) => handle,
        // 解析之后被删除
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ServeError::NotFound(file.name.clone()));
        }
        Err(e) => return Err(e.into()),
    };
    if offset > 0 {
        handle.seek(SeekFrom::Start(offset)).await?;
    }
    debug!("Streaming {:?} from offset {}", file.path, offset);
    Ok(ReaderStream::with_capacity(handle, CHUNK_SIZE))
}

/// 构建下载响应头
pub fn build_headers(file: &StoredFile, range: &ResolvedRange) -> Result<HeaderMap, ServeError> {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::CONTENT_DISPOSITION,
        header_value(&content_disposition(&file.name))?,
    );
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(range.remaining()));
    headers.insert(header::CONTENT_RANGE, header_value(&range.content_range())?);
    if let Some(date) = file.modified.and_then(http_date) {
        headers.insert(header::LAST_MODIFIED, header_value(&date)?);
    }
    headers.insert(header::CONTENT_TYPE, header_value(&file.content_type)?);

    Ok(headers)
}

/// RFC 1123 格式的时间，早于 Unix 纪元或晚于 9999 年时为 `None`
pub fn http_date(time: SystemTime) -> Option<String> {
    let secs = time.duration_since(UNIX_EPOCH).ok()?.as_secs();
    (secs < HTTP_DATE_LIMIT_SECS).then(|| httpdate::fmt_http_date(time))
}

/// `attachment; filename="<百分号编码的文件名>"`
pub fn content_disposition(name: &str) -> String {
    format!(
        "attachment; filename=\"{}\"",
        utf8_percent_encode(name, FILENAME_ENCODE_SET)
    )
}

fn header_value(value: &str) -> Result<HeaderValue, ServeError> {
    HeaderValue::from_str(value)
        .map_err(|e| ServeError::Io(std::io::Error::new(ErrorKind::InvalidData, e)))
}
