//! 上传接收
//!
//! 将字节流原样写入 `<存储目录>/<文件名>`，同名文件直接覆盖。
//! 同名并发上传不做协调，写入可能交错，以最后完成的为准。

use crate::error::ServeError;
use crate::storage::Storage;
use axum::body::Bytes;
use futures_util::{Stream, StreamExt};
use log::{debug, info};
use std::fmt::Display;
use std::pin::pin;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// 上传接收器
#[derive(Debug, Clone)]
pub struct UploadReceiver {
    storage: Storage,
}

impl UploadReceiver {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// 写入上传内容，返回保存的文件名
    ///
    /// 流中途出错时保留已写入的部分文件，重新上传即可覆盖。
    pub async fn receive<S, E>(&self, filename: &str, stream: S) -> Result<String, ServeError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let path = self.storage.upload_path(filename)?;
        let mut file = File::create(&path).await?;
        let mut stream = pin!(stream);
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| ServeError::BadRequest(format!("Upload interrupted: {e}")))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!("Wrote {} bytes to {:?}", written, path);
        info!("Upload {} ({} bytes)", filename, written);

        Ok(filename.to_string())
    }
}
