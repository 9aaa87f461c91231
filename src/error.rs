use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{error::Category, json};
use thiserror::Error;
use tracing::error;

/// Webhook 负载校验错误
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("负载不是合法的 JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("负载结构不符合要求: {0}")]
    Schema(#[source] serde_json::Error),
}

impl From<serde_json::Error> for ValidationError {
    fn from(e: serde_json::Error) -> Self {
        match e.classify() {
            Category::Data => ValidationError::Schema(e),
            Category::Io | Category::Syntax | Category::Eof => ValidationError::MalformedJson(e),
        }
    }
}

/// 缓存失效后端错误
#[derive(Error, Debug)]
pub enum InvalidationError {
    #[error("路径失效失败: {path} - {message}")]
    Path {
        path: String,
        message: String,
    },

    #[error("标签失效失败: {tag} - {message}")]
    Tag {
        tag: String,
        message: String,
    },
}

/// 重新验证流程中的错误
#[derive(Error, Debug)]
pub enum RevalidateError {
    #[error("校验失败: {0}")]
    Validation(#[from] ValidationError),

    #[error("缓存后端错误: {0}")]
    Backend(#[from] InvalidationError),

    #[error("webhook 密钥无效")]
    Unauthorized,
}

impl RevalidateError {
    /// 对应的 HTTP 状态码
    pub fn status(&self) -> StatusCode {
        match self {
            RevalidateError::Validation(_) => StatusCode::BAD_REQUEST,
            RevalidateError::Unauthorized => StatusCode::UNAUTHORIZED,
            RevalidateError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RevalidateError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Revalidation failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
