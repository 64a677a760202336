//! 存储目录
//!
//! 所有上传和下载的文件都位于同一个存储目录下。文件名必须是单个普通路径分量，
//! 下载时还会规范化路径并确认结果仍在存储目录内（防止符号链接逃逸）。

use crate::error::ServeError;
use log::debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// 存储目录中的一个文件
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// 文件名（即下载时的 file_id）
    pub name: String,
    /// 规范化后的绝对路径
    pub path: PathBuf,
    pub size: u64,
    /// 平台不支持时为 `None`
    pub modified: Option<SystemTime>,
    pub content_type: String,
}

/// 存储目录句柄
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// 打开存储目录，不存在时创建
    pub async fn open(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref();
        tokio::fs::create_dir_all(root).await?;
        let root = tokio::fs::canonicalize(root).await?;
        debug!("Storage root: {:?}", root);
        Ok(Self { root })
    }

    /// 规范化后的存储目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 上传目标路径，文件名不安全时返回 `InvalidFilename`
    pub fn upload_path(&self, filename: &str) -> Result<PathBuf, ServeError> {
        if !is_safe_name(filename) {
            return Err(ServeError::InvalidFilename(filename.to_string()));
        }
        Ok(self.root.join(filename))
    }

    /// 将 file_id 解析为存储目录内的普通文件并读取元数据
    pub async fn resolve(&self, file_id: &str) -> Result<StoredFile, ServeError> {
        if !is_safe_name(file_id) {
            return Err(ServeError::NotFound(file_id.to_string()));
        }

        let path = match tokio::fs::canonicalize(self.root.join(file_id)).await {
            Ok(path) => path,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ServeError::NotFound(file_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if !path.starts_with(&self.root) {
            return Err(ServeError::NotFound(file_id.to_string()));
        }

        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(ServeError::NotFound(file_id.to_string()));
        }

        Ok(StoredFile {
            name: file_id.to_string(),
            size: metadata.len(),
            modified: metadata.modified().ok(),
            content_type: guess_content_type(file_id),
            path,
        })
    }
}

/// 文件名是否为单个普通路径分量
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// 按扩展名猜测 MIME 类型，未识别时为 `application/octet-stream`
pub fn guess_content_type(name: &str) -> String {
    mime_guess::from_path(name).first_or_octet_stream().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_names() {
        assert!(is_safe_name("a.txt"));
        assert!(is_safe_name("报告 2024.pdf"));
        assert!(is_safe_name("..hidden"));

        assert!(!is_safe_name(""));
        assert!(!is_safe_name("."));
        assert!(!is_safe_name(".."));
        assert!(!is_safe_name("../etc/passwd"));
        assert!(!is_safe_name("sub/a.txt"));
        assert!(!is_safe_name("..\\windows"));
        assert!(!is_safe_name("a\0b"));
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("a.txt"), "text/plain");
        assert_eq!(guess_content_type("movie.mp4"), "video/mp4");
        assert_eq!(
            guess_content_type("blob.unknownext"),
            "application/octet-stream"
        );
        assert_eq!(guess_content_type("noext"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_open_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("static");
        let storage = Storage::open(&root).await.unwrap();
        assert!(storage.root().is_dir());
        assert!(storage.root().is_absolute());
    }

    #[tokio::test]
    async fn test_resolve_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();
        tokio::fs::write(storage.root().join("a.txt"), b"0123456789")
            .await
            .unwrap();

        let file = storage.resolve("a.txt").await.unwrap();
        assert_eq!(file.name, "a.txt");
        assert_eq!(file.size, 10);
        assert_eq!(file.content_type, "text/plain");
        assert!(file.modified.is_some());
        assert!(file.path.starts_with(storage.root()));
    }

    #[tokio::test]
    async fn test_resolve_rejects_missing_and_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let storage = Storage::open(&root).await.unwrap();
        tokio::fs::write(dir.path().join("outside.txt"), b"secret")
            .await
            .unwrap();
        tokio::fs::create_dir(storage.root().join("sub")).await.unwrap();

        for id in ["missing.txt", "../outside.txt", "..", "sub"] {
            let err = storage.resolve(id).await.unwrap_err();
            assert!(matches!(err, ServeError::NotFound(_)), "{id}: {err}");
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_rejects_symlink_escape() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let storage = Storage::open(&root).await.unwrap();
        let outside = dir.path().join("outside.txt");
        tokio::fs::write(&outside, b"secret").await.unwrap();
        tokio::fs::symlink(&outside, storage.root().join("link.txt"))
            .await
            .unwrap();

        let err = storage.resolve("link.txt").await.unwrap_err();
        assert!(matches!(err, ServeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upload_path() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();

        let path = storage.upload_path("a.txt").unwrap();
        assert_eq!(path, storage.root().join("a.txt"));

        let err = storage.upload_path("../a.txt").unwrap_err();
        assert!(matches!(err, ServeError::InvalidFilename(_)));
    }
}
