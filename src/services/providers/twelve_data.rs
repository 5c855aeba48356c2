//! Twelve Data 数据源适配器
//!
//! 对接 https://api.twelvedata.com
//! 免费档无涨跌幅榜和新闻能力，对应接口返回空列表

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use futures::future::join_all;
use reqwest::Client;

use crate::config::UpstreamConfig;
use crate::errors::{MarketError, MarketResult};
use crate::models::{
    CandleSeries, CandleStatus, CompanyProfile, IndexSnapshot, MarketMover, NewsItem, StockQuote,
    SymbolMatch,
};
use crate::services::providers::common::{
    build_client, get_json, json_f64, json_str, json_u64, TWELVE_DATA_API,
};
use crate::services::providers::MarketProvider;

const PROVIDER: &str = "twelve_data";

/// 固定指数列表（印度市场）
const INDICES: [(&str, &str); 3] = [
    ("NIFTY", "NIFTY 50"),
    ("BSE", "SENSEX"),
    ("BANKNIFTY", "NIFTY BANK"),
];

/// Twelve Data 适配器
pub struct TwelveDataClient {
    client: Client,
    api_key: String,
}

impl TwelveDataClient {
    pub fn new(upstream: &UpstreamConfig, api_key: String) -> Self {
        Self {
            client: build_client(upstream, false),
            api_key,
        }
    }

    /// 把内部周期代码映射为 Twelve Data 的 interval 词汇
    fn map_interval(resolution: &str) -> &'static str {
        match resolution {
            "5" => "5min",
            "15" => "15min",
            "30" => "30min",
            "60" => "1h",
            _ => "1day",
        }
    }

    /// 接口返回 status=error 时转为上游错误
    fn check_status(data: &serde_json::Value) -> MarketResult<()> {
        if data["status"].as_str() == Some("error") {
            let message = json_str(&data["message"]);
            if json_f64(&data["code"]) == 429.0 {
                return Err(MarketError::RateLimited(PROVIDER));
            }
            return Err(MarketError::upstream(PROVIDER, message));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketProvider for TwelveDataClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    /// 实时报价，对应 /quote（数值字段均为字符串）
    async fn get_quote(&self, symbol: &str) -> MarketResult<StockQuote> {
        let url = format!("{}/quote", TWELVE_DATA_API);
        let data = get_json(
            &self.client,
            PROVIDER,
            &url,
            &[("symbol", symbol), ("apikey", &self.api_key)],
        )
        .await?;
        Self::check_status(&data)?;

        let price = json_f64(&data["close"]);
        let previous_close = json_f64(&data["previous_close"]);
        let change = if previous_close > 0.0 { price - previous_close } else { 0.0 };
        let change_percent = if previous_close > 0.0 { change / previous_close * 100.0 } else { 0.0 };

        let week52_high = json_f64(&data["fifty_two_week"]["high"]);
        let week52_low = json_f64(&data["fifty_two_week"]["low"]);
        let estimated = week52_high == 0.0 && week52_low == 0.0;

        Ok(StockQuote {
            symbol: json_str(&data["symbol"]),
            name: json_str(&data["name"]),
            price,
            change,
            change_percent,
            high: json_f64(&data["high"]),
            low: json_f64(&data["low"]),
            open: json_f64(&data["open"]),
            previous_close,
            volume: json_u64(&data["volume"]),
            currency: {
                let c = json_str(&data["currency"]);
                if c.is_empty() { "USD".to_string() } else { c }
            },
            exchange: json_str(&data["exchange"]),
            fifty_two_week_high: if estimated { price * 1.25 } else { week52_high },
            fifty_two_week_low: if estimated { price * 0.75 } else { week52_low },
            fifty_two_week_estimated: estimated,
        })
    }

    /// 概况由报价接口字段合成
    async fn get_profile(&self, symbol: &str) -> MarketResult<CompanyProfile> {
        let quote = self.get_quote(symbol).await?;

        Ok(CompanyProfile {
            symbol: quote.symbol,
            name: quote.name,
            country: String::new(),
            currency: quote.currency,
            exchange: quote.exchange,
            industry: String::new(),
            market_capitalization: 0.0,
            logo: String::new(),
            weburl: String::new(),
        })
    }

    /// K线，对应 /time_series（倒序返回，需要反转）
    async fn get_candles(
        &self,
        symbol: &str,
        resolution: &str,
        from: i64,
        to: i64,
    ) -> MarketResult<CandleSeries> {
        let start_date = Utc
            .timestamp_opt(from, 0)
            .single()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let end_date = Utc
            .timestamp_opt(to, 0)
            .single()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        let url = format!("{}/time_series", TWELVE_DATA_API);
        let data = get_json(
            &self.client,
            PROVIDER,
            &url,
            &[
                ("symbol", symbol),
                ("interval", Self::map_interval(resolution)),
                ("start_date", &start_date),
                ("end_date", &end_date),
                ("apikey", &self.api_key),
            ],
        )
        .await?;

        let values = match data["values"].as_array() {
            Some(v) if !v.is_empty() && data["status"].as_str() != Some("error") => v.clone(),
            _ => return Ok(CandleSeries::no_data()),
        };

        // 接口按时间倒序返回
        let mut candles = CandleSeries::default();
        for row in values.iter().rev() {
            candles.push(
                parse_datetime(&json_str(&row["datetime"])),
                json_f64(&row["open"]),
                json_f64(&row["high"]),
                json_f64(&row["low"]),
                json_f64(&row["close"]),
                json_u64(&row["volume"]),
            );
        }
        candles.s = CandleStatus::Ok;
        Ok(candles)
    }

    /// 代码搜索，对应 /symbol_search
    async fn search_symbols(&self, query: &str) -> MarketResult<Vec<SymbolMatch>> {
        let url = format!("{}/symbol_search", TWELVE_DATA_API);
        let data = get_json(
            &self.client,
            PROVIDER,
            &url,
            &[("symbol", query), ("apikey", &self.api_key)],
        )
        .await?;

        let results = data["data"].as_array().cloned().unwrap_or_default();
        Ok(results
            .iter()
            .map(|r| SymbolMatch {
                symbol: json_str(&r["symbol"]),
                description: json_str(&r["instrument_name"]),
                name: json_str(&r["instrument_name"]),
                instrument_type: json_str(&r["instrument_type"]),
                exchange: json_str(&r["exchange"]),
            })
            .collect())
    }

    /// 印度指数快照，并发取报价，失败的跳过
    async fn get_indices(&self) -> MarketResult<Vec<IndexSnapshot>> {
        let tasks = INDICES.iter().map(|(symbol, name)| async move {
            match self.get_quote(symbol).await {
                Ok(quote) => Some(IndexSnapshot {
                    name: name.to_string(),
                    value: quote.price,
                    change: quote.change,
                    change_percent: quote.change_percent,
                }),
                Err(e) => {
                    log::warn!("获取指数 {} 失败: {}", name, e);
                    None
                }
            }
        });

        Ok(join_all(tasks).await.into_iter().flatten().collect())
    }

    /// 涨跌幅榜为付费能力，返回空列表
    async fn get_gainers(&self) -> MarketResult<Vec<MarketMover>> {
        Ok(Vec::new())
    }

    /// 涨跌幅榜为付费能力，返回空列表
    async fn get_losers(&self) -> MarketResult<Vec<MarketMover>> {
        Ok(Vec::new())
    }

    /// 免费档无新闻能力，返回空列表
    async fn get_news(&self, _symbol: &str) -> MarketResult<Vec<NewsItem>> {
        Ok(Vec::new())
    }
}

/// 解析 datetime 字段（日线为 YYYY-MM-DD，分钟线带时分秒）
fn parse_datetime(raw: &str) -> i64 {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return dt.and_utc().timestamp();
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp()).unwrap_or(0))
        .unwrap_or(0)
}

// ==================== 测试模块 ====================
