//! 错误类型定义
//!
//! 区分上游数据源错误和客户端输入错误，
//! 空数据不算错误（由 K 线的 s 状态位表示）

use thiserror::Error;

/// 行情服务错误
#[derive(Debug, Error)]
pub enum MarketError {
    /// 上游数据源调用失败（网络、认证、解析等）
    #[error("{provider}: {message}")]
    Upstream { provider: &'static str, message: String },

    /// 上游数据源限流
    #[error("{0}: 请求被限流")]
    RateLimited(&'static str),

    /// 股票代码不存在或已退市
    #[error("未找到股票代码: {0}")]
    SymbolNotFound(String),

    /// 客户端参数错误
    #[error("参数错误: {0}")]
    Validation(String),
}

impl MarketError {
    /// 构造上游错误
    pub fn upstream(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider,
            message: message.into(),
        }
    }
}

pub type MarketResult<T> = Result<T, MarketError>;
