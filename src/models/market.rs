//! 行情数据模型
//!
//! 定义行情相关的数据结构，包括：
//! - 股票实时报价
//! - 公司概况
//! - K线序列
//! - 新闻及情绪标签
//! - 指数快照、涨跌幅榜、代码搜索

use serde::{Deserialize, Serialize};

/// 股票实时报价
///
/// 各数据源的原始字段统一映射为该结构
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    /// 股票代码（如 RELIANCE.NS、AAPL）
    pub symbol: String,
    /// 名称
    pub name: String,
    /// 最新价
    pub price: f64,
    /// 涨跌额
    pub change: f64,
    /// 涨跌幅（百分比）
    pub change_percent: f64,
    /// 当日最高价
    pub high: f64,
    /// 当日最低价
    pub low: f64,
    /// 开盘价
    pub open: f64,
    /// 昨收价
    pub previous_close: f64,
    /// 成交量
    pub volume: u64,
    /// 计价货币
    pub currency: String,
    /// 交易所
    pub exchange: String,
    /// 52周最高价
    pub fifty_two_week_high: f64,
    /// 52周最低价
    pub fifty_two_week_low: f64,
    /// 52周高低为 ±25% 估算值时为 true
    #[serde(default)]
    pub fifty_two_week_estimated: bool,
}

/// 公司概况
///
/// 缺失字段填空串或 0，不向下游传播 null
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    /// 股票代码
    pub symbol: String,
    /// 公司名称
    pub name: String,
    /// 国家
    pub country: String,
    /// 计价货币
    pub currency: String,
    /// 交易所
    pub exchange: String,
    /// 行业
    pub industry: String,
    /// 市值
    pub market_capitalization: f64,
    /// 公司 Logo 地址
    pub logo: String,
    /// 官网地址
    pub weburl: String,
}

/// K线序列状态
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum CandleStatus {
    /// 有数据
    #[serde(rename = "ok")]
    Ok,
    /// 区间内无数据（不是错误）
    #[serde(rename = "no_data")]
    NoData,
}

/// K线序列（OHLCV）
///
/// 六个数组等长，时间戳升序；s 为 no_data 时全部为空
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CandleSeries {
    /// 时间戳（秒）
    pub t: Vec<i64>,
    /// 开盘价
    pub o: Vec<f64>,
    /// 最高价
    pub h: Vec<f64>,
    /// 最低价
    pub l: Vec<f64>,
    /// 收盘价
    pub c: Vec<f64>,
    /// 成交量
    pub v: Vec<u64>,
    /// 状态位
    pub s: CandleStatus,
}

impl CandleSeries {
    /// 空序列（区间内无数据）
    pub fn no_data() -> Self {
        Self {
            t: Vec::new(),
            o: Vec::new(),
            h: Vec::new(),
            l: Vec::new(),
            c: Vec::new(),
            v: Vec::new(),
            s: CandleStatus::NoData,
        }
    }

    /// 追加一根K线
    pub fn push(&mut self, t: i64, o: f64, h: f64, l: f64, c: f64, v: u64) {
        self.t.push(t);
        self.o.push(o);
        self.h.push(h);
        self.l.push(l);
        self.c.push(c);
        self.v.push(v);
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

impl Default for CandleSeries {
    fn default() -> Self {
        Self {
            t: Vec::new(),
            o: Vec::new(),
            h: Vec::new(),
            l: Vec::new(),
            c: Vec::new(),
            v: Vec::new(),
            s: CandleStatus::Ok,
        }
    }
}

/// 情绪标签
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

/// 新闻情绪
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Sentiment {
    /// 标签：positive / negative / neutral
    pub sentiment: SentimentLabel,
    /// 得分，[-1, 1]
    pub score: f64,
}

/// 新闻条目
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewsItem {
    /// 唯一标识
    pub id: String,
    /// 分类
    pub category: String,
    /// 发布时间戳（秒）
    pub datetime: i64,
    /// 标题
    pub headline: String,
    /// 摘要
    pub summary: String,
    /// 来源
    pub source: String,
    /// 原文链接
    pub url: String,
    /// 配图地址（可为空串）
    pub image: String,
    /// 关联股票代码
    pub related: String,
    /// 情绪标签；数据源自带时原样透传，否则由服务端补充
    pub sentiment: Option<Sentiment>,
}

/// 指数快照
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct IndexSnapshot {
    /// 指数名称（如 NIFTY 50）
    pub name: String,
    /// 点位
    pub value: f64,
    /// 涨跌额
    pub change: f64,
    /// 涨跌幅（百分比）
    pub change_percent: f64,
}

/// 涨跌幅榜条目
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MarketMover {
    /// 股票代码
    pub symbol: String,
    /// 名称
    pub name: String,
    /// 最新价
    pub ltp: f64,
    /// 涨跌额
    pub net_price: f64,
    /// 涨跌幅（百分比）
    pub per_change: f64,
}

/// 代码搜索结果
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SymbolMatch {
    /// 股票代码
    pub symbol: String,
    /// 描述（一般为公司名）
    pub description: String,
    /// 名称
    pub name: String,
    /// 证券类型
    #[serde(rename = "type")]
    pub instrument_type: String,
    /// 交易所
    pub exchange: String,
}

/// K线查询参数
#[derive(Debug, Deserialize)]
pub struct CandleQuery {
    /// 周期代码：5 / 15 / 30 / 60 / D，默认 D
    pub resolution: Option<String>,
    /// 起始时间戳（秒）
    pub from: i64,
    /// 结束时间戳（秒）
    pub to: i64,
}
