//! HTTP Client - 与文件服务器通信

use anyhow::{Context, Result, anyhow, bail};
use futures_util::StreamExt;
use reqwest::{StatusCode, Url, header};
use serde::Deserialize;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

#[derive(Deserialize, Debug)]
struct UploadReply {
    filename: String,
}

/// 一次下载的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// 本次写入的字节数
    pub written: u64,
    /// 是否在已有文件后追加
    pub resumed: bool,
    /// 服务器返回的 `content-range`
    pub content_range: Option<String>,
}

pub struct Client {
    base: Url,
    http: reqwest::Client,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("Invalid server URL: {base_url}"))?;
        Ok(Self {
            base,
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("Server URL cannot be a base: {}", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// 健康检查
    pub async fn hello(&self) -> Result<serde_json::Value> {
        let resp = self
            .http
            .get(self.endpoint(&["hello"])?)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    /// 流式上传本地文件，返回服务器保存的文件名
    pub async fn upload(&self, path: &Path) -> Result<String> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("Path has no usable file name: {}", path.display()))?
            .to_string();

        let file = File::open(path)
            .await
            .with_context(|| format!("Cannot open {}", path.display()))?;
        let len = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let part = reqwest::multipart::Part::stream_with_length(body, len).file_name(name);
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .http
            .post(self.endpoint(&["upload"])?)
            .multipart(form)
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!("Upload failed: {}", resp.status());
        }
        let reply: UploadReply = resp.json().await?;
        Ok(reply.filename)
    }

    /// 下载文件到 `output`
    ///
    /// `resume` 为真且本地文件已存在时，请求 `bytes=<本地大小>-` 并追加写入；
    /// 服务器返回 200 时改为从头覆盖。
    pub async fn download(&self, name: &str, output: &Path, resume: bool) -> Result<DownloadOutcome> {
        let offset = if resume {
            tokio::fs::metadata(output).await.map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };

        let mut request = self.http.get(self.endpoint(&["download", name])?);
        if offset > 0 {
            request = request.header(header::RANGE, format!("bytes={offset}-"));
        }
        let resp = request.send().await?;

        let resumed = match resp.status() {
            StatusCode::PARTIAL_CONTENT => offset > 0,
            StatusCode::OK => false,
            StatusCode::NOT_FOUND => bail!("File not found on server: {name}"),
            status => bail!("Download failed: {status}"),
        };
        let content_range = resp
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut file = if resumed {
            OpenOptions::new().append(true).open(output).await?
        } else {
            File::create(output).await?
        };

        let mut written: u64 = 0;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(DownloadOutcome {
            written,
            resumed,
            content_range,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rangehost_core::{AppState, Storage, router};
    use std::sync::Arc;

    async fn spawn_server() -> (tempfile::TempDir, Storage, String) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path().join("static")).await.unwrap();
        let app = router(Arc::new(AppState::new(storage.clone())), "/static");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (dir, storage, format!("http://{addr}"))
    }

    #[tokio::test]
    async fn test_hello() {
        let (_dir, _storage, base) = spawn_server().await;
        let client = Client::new(&base).unwrap();
        let reply = client.hello().await.unwrap();
        assert_eq!(reply["hello"], "world");
    }

    #[tokio::test]
    async fn test_upload_and_download() {
        let (dir, storage, base) = spawn_server().await;
        let client = Client::new(&base).unwrap();

        let local = dir.path().join("notes 1.txt");
        tokio::fs::write(&local, b"0123456789").await.unwrap();
        let stored = client.upload(&local).await.unwrap();
        assert_eq!(stored, "notes 1.txt");
        assert!(storage.root().join("notes 1.txt").exists());

        let output = dir.path().join("out.txt");
        let outcome = client.download(&stored, &output, false).await.unwrap();
        assert_eq!(outcome.written, 10);
        assert!(!outcome.resumed);
        assert_eq!(outcome.content_range.as_deref(), Some("bytes 0-9/10"));
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"0123456789");
    }

    #[tokio::test]
    async fn test_resume_appends_remaining_bytes() {
        let (dir, storage, base) = spawn_server().await;
        tokio::fs::write(storage.root().join("a.txt"), b"0123456789")
            .await
            .unwrap();
        let client = Client::new(&base).unwrap();

        // 模拟中断后的部分文件
        let output = dir.path().join("a.part");
        tokio::fs::write(&output, b"01234").await.unwrap();

        let outcome = client.download("a.txt", &output, true).await.unwrap();
        assert!(outcome.resumed);
        assert_eq!(outcome.written, 5);
        assert_eq!(outcome.content_range.as_deref(), Some("bytes 5-9/10"));
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"0123456789");
    }

    #[tokio::test]
    async fn test_download_missing() {
        let (dir, _storage, base) = spawn_server().await;
        let client = Client::new(&base).unwrap();
        let err = client
            .download("missing.bin", &dir.path().join("x"), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
