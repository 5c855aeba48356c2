//! 通用响应模型
//!
//! 成功响应直接返回实体 JSON；失败返回 {"error": "..."}

use serde::{Deserialize, Serialize};

/// 错误响应体
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// 错误信息
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// 删除/更新操作确认体
#[derive(Debug, Serialize, Deserialize)]
pub struct AckBody {
    /// 操作是否成功
    pub success: bool,
}

impl AckBody {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
