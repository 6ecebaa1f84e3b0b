//! 通用 API 响应模型
//! 
//! 定义统一的 API 响应格式

use serde::{Deserialize, Serialize};

use crate::services::market::eastern_now;

/// 统一 API 响应结构
/// 
/// 除 /prices/live 外的接口都返回该格式：
/// - success: 请求是否成功
/// - data: 响应数据（成功时有值）
/// - message: 响应消息
/// - timestamp: 响应时间戳（美东时间）
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// 请求是否成功
    pub success: bool,
    /// 响应数据
    pub data: Option<T>,
    /// 响应消息
    pub message: String,
    /// 响应时间戳（ISO 8601 格式）
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self::success_with_message(data, "Success")
    }

    /// 创建带说明的成功响应
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            timestamp: eastern_now().to_rfc3339(),
        }
    }

    /// 创建错误响应
    /// 
    /// # 参数
    /// - message: 错误信息
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message,
            timestamp: eastern_now().to_rfc3339(),
        }
    }
}
