//! 业务逻辑服务模块
//!
//! 封装数据获取和处理逻辑

pub mod market_service;  // 行情聚合服务
pub mod providers;       // 各数据源适配器
pub mod sentiment;       // 新闻情绪打分
