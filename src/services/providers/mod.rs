//! 行情数据源适配器
//!
//! 每个适配器对接一个外部行情 API，把各家的原始响应
//! 统一映射为内部数据结构；simulated 为无网络兜底数据源

pub mod alpha_vantage;
pub mod common;
pub mod finnhub;
pub mod nse;
pub mod simulated;
pub mod twelve_data;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageClient;
pub use finnhub::FinnhubClient;
pub use nse::NseClient;
pub use simulated::SimulatedMarket;
pub use twelve_data::TwelveDataClient;
pub use yahoo::YahooClient;

use async_trait::async_trait;

use crate::errors::MarketResult;
use crate::models::{
    CandleSeries, CompanyProfile, IndexSnapshot, MarketMover, NewsItem, StockQuote, SymbolMatch,
};

/// 市场分类
///
/// 由代码后缀判定，是数据源路由的唯一依据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Market {
    /// 印度市场（.NS / .BO 后缀）
    India,
    /// 其他市场
    Global,
}

impl Market {
    /// 对任意代码字符串做市场分类（纯函数，全定义域）
    pub fn of(symbol: &str) -> Self {
        if symbol.ends_with(".NS") || symbol.ends_with(".BO") {
            Market::India
        } else {
            Market::Global
        }
    }
}

/// 行情数据源统一接口
///
/// 五个外部数据源和模拟数据源都实现该接口，
/// 由聚合服务按市场分类选择调用
#[async_trait]
pub trait MarketProvider: Send + Sync {
    /// 数据源名称（用于日志）
    fn name(&self) -> &'static str;

    /// 获取单只股票实时报价
    async fn get_quote(&self, symbol: &str) -> MarketResult<StockQuote>;

    /// 获取公司概况
    async fn get_profile(&self, symbol: &str) -> MarketResult<CompanyProfile>;

    /// 获取K线序列，过滤到 [from, to] 闭区间并按时间升序；
    /// 区间内无数据时返回 no_data 空序列而不是报错
    async fn get_candles(
        &self,
        symbol: &str,
        resolution: &str,
        from: i64,
        to: i64,
    ) -> MarketResult<CandleSeries>;

    /// 按关键字搜索股票代码，顺序为数据源自身的匹配度排序
    async fn search_symbols(&self, query: &str) -> MarketResult<Vec<SymbolMatch>>;

    /// 获取固定指数列表的快照
    async fn get_indices(&self) -> MarketResult<Vec<IndexSnapshot>>;

    /// 获取涨幅榜（changePercent > 0，降序，前10）
    async fn get_gainers(&self) -> MarketResult<Vec<MarketMover>>;

    /// 获取跌幅榜（changePercent < 0，升序，前10）
    async fn get_losers(&self) -> MarketResult<Vec<MarketMover>>;

    /// 获取个股新闻；无新闻能力的数据源返回空列表而不是报错
    async fn get_news(&self, symbol: &str) -> MarketResult<Vec<NewsItem>>;
}

// ==================== 测试模块 ====================
