//! HTTP 错误类型
//!
//! 报价和缓存层的失败在各自层内降级处理，只有配置错误和请求错误会到达这里

use actix_web::{http::StatusCode, HttpResponse, ResponseError};

use crate::models::ApiResponse;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 缺少必要配置（API Key、定时任务 Token 等）
    #[error("配置错误: {0}")]
    Config(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("内部错误: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(e) = self {
            log::error!("请求处理失败: {:#}", e);
        }
        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::error(self.to_string()))
    }
}

pub type AppResult<T> = Result<T, AppError>;
