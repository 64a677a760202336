//! 错误类型
//!
//! 范围头格式错误不属于错误：无法识别的 `Range` 一律按整文件下载处理。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::{error, warn};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// 文件不存在、不是普通文件，或路径越出存储目录
    #[error("File not found: {0}")]
    NotFound(String),

    /// 上传文件名包含路径分隔符或 `..` 等
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServeError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::NotFound(_) => StatusCode::NOT_FOUND,
            ServeError::InvalidFilename(_) | ServeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        // 响应体里不带内部路径，详细信息只进日志
        let detail = match &self {
            ServeError::NotFound(name) => {
                warn!("Rejected request for missing file: {}", name);
                "File not found".to_string()
            }
            ServeError::InvalidFilename(name) => {
                warn!("Rejected unsafe filename: {:?}", name);
                "Invalid filename".to_string()
            }
            ServeError::BadRequest(msg) => {
                warn!("Bad request: {}", msg);
                msg.clone()
            }
            ServeError::Io(e) => {
                error!("IO failure: {}", e);
                "Internal server error".to_string()
            }
        };

        (self.status(), Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServeError::NotFound("a.txt".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServeError::InvalidFilename("../a".into()).status(),
            StatusCode::BAD_REQUEST
        );
        let io = std::io::Error::other("disk full");
        assert_eq!(
            ServeError::from(io).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_not_found_body_hides_path() {
        let response = ServeError::NotFound("/srv/secret/a.txt".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("/srv/secret"));
        assert!(text.contains("File not found"));
    }
}
