//! 自选股与持仓数据模型
//!
//! 定义自选股、持仓条目及其新增/更新载荷

use serde::{Deserialize, Serialize};

/// 自选股条目
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    /// 自增 id
    pub id: i64,
    /// 所属用户 id
    pub user_id: i64,
    /// 股票代码
    pub symbol: String,
    /// 市场标签（如 NSE、GLOBAL）
    pub market: String,
    /// 添加时间（ISO 8601）
    pub added_at: String,
}

/// 新增自选股载荷
#[derive(Debug, Deserialize, Clone)]
pub struct NewWatchlistItem {
    /// 股票代码
    pub symbol: String,
    /// 市场标签
    pub market: String,
}

/// 持仓条目
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    /// 自增 id
    pub id: i64,
    /// 所属用户 id
    pub user_id: i64,
    /// 股票代码
    pub symbol: String,
    /// 持仓数量
    pub quantity: f64,
    /// 平均成本价
    pub avg_price: f64,
    /// 市场标签
    pub market: String,
    /// 建仓时间（ISO 8601）
    pub created_at: String,
}

/// 新增持仓载荷
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewPortfolioItem {
    /// 股票代码
    pub symbol: String,
    /// 持仓数量
    pub quantity: f64,
    /// 平均成本价
    pub avg_price: f64,
    /// 市场标签
    pub market: String,
}

/// 更新持仓载荷（数量与成本价原地更新）
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePortfolioItem {
    /// 持仓数量
    pub quantity: f64,
    /// 平均成本价
    pub avg_price: f64,
}
