//! Finnhub 数据源适配器
//!
//! 对接 https://finnhub.io/api/v1
//! 提供报价、概况、K线、搜索和个股新闻（最近7天）

use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::future::join_all;
use reqwest::Client;
use std::cmp::Ordering;

use crate::config::UpstreamConfig;
use crate::errors::{MarketError, MarketResult};
use crate::models::{
    CandleSeries, CandleStatus, CompanyProfile, IndexSnapshot, MarketMover, NewsItem, StockQuote,
    SymbolMatch,
};
use crate::services::providers::common::{
    build_client, currency_for, exchange_for, get_json, json_f64, json_str, json_u64, FINNHUB_API,
};
use crate::services::providers::MarketProvider;

const PROVIDER: &str = "finnhub";

/// 固定指数列表：代码与展示名
const INDICES: [(&str, &str); 5] = [
    ("^NSEI", "NIFTY 50"),
    ("^BSESN", "BSE SENSEX"),
    ("^GSPC", "S&P 500"),
    ("^DJI", "Dow Jones"),
    ("^IXIC", "NASDAQ"),
];

/// 涨跌幅榜扫描的固定股票池（NSE 权重股）
const MOVER_UNIVERSE: [&str; 15] = [
    "RELIANCE.NS",
    "TCS.NS",
    "HDFCBANK.NS",
    "INFY.NS",
    "HINDUNILVR.NS",
    "ICICIBANK.NS",
    "KOTAKBANK.NS",
    "BHARTIARTL.NS",
    "ITC.NS",
    "SBIN.NS",
    "ADANIPORTS.NS",
    "WIPRO.NS",
    "MARUTI.NS",
    "BAJFINANCE.NS",
    "NESTLEIND.NS",
];

/// Finnhub 适配器
pub struct FinnhubClient {
    client: Client,
    api_key: String,
}

impl FinnhubClient {
    pub fn new(upstream: &UpstreamConfig, api_key: String) -> Self {
        Self {
            client: build_client(upstream, false),
            api_key,
        }
    }

    /// 并发扫描股票池，单只失败跳过
    async fn scan_movers(&self) -> Vec<MarketMover> {
        let tasks = MOVER_UNIVERSE.iter().map(|symbol| async move {
            match self.get_quote(symbol).await {
                Ok(quote) => {
                    // 名称来自概况接口，失败时退回裸代码
                    let name = match self.get_profile(symbol).await {
                        Ok(profile) if !profile.name.is_empty() => profile.name,
                        _ => symbol.trim_end_matches(".NS").to_string(),
                    };
                    Some(MarketMover {
                        symbol: symbol.to_string(),
                        name,
                        ltp: quote.price,
                        net_price: quote.change,
                        per_change: quote.change_percent,
                    })
                }
                Err(e) => {
                    log::warn!("扫描 {} 失败: {}", symbol, e);
                    None
                }
            }
        });

        join_all(tasks).await.into_iter().flatten().collect()
    }
}

#[async_trait]
impl MarketProvider for FinnhubClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    /// 实时报价，对应 /quote
    async fn get_quote(&self, symbol: &str) -> MarketResult<StockQuote> {
        let url = format!("{}/quote", FINNHUB_API);
        let data = get_json(
            &self.client,
            PROVIDER,
            &url,
            &[("symbol", symbol), ("token", &self.api_key)],
        )
        .await?;

        let price = json_f64(&data["c"]);
        let previous_close = json_f64(&data["pc"]);
        // 无效代码返回全零
        if price == 0.0 && previous_close == 0.0 {
            return Err(MarketError::SymbolNotFound(symbol.to_string()));
        }

        let change = if previous_close > 0.0 { price - previous_close } else { 0.0 };
        let change_percent = if previous_close > 0.0 { change / previous_close * 100.0 } else { 0.0 };

        Ok(StockQuote {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            price,
            change,
            change_percent,
            high: json_f64(&data["h"]),
            low: json_f64(&data["l"]),
            open: json_f64(&data["o"]),
            previous_close,
            volume: 0,
            currency: currency_for(symbol).to_string(),
            exchange: exchange_for(symbol).to_string(),
            // /quote 不含52周高低，按最新价 ±25% 估算
            fifty_two_week_high: price * 1.25,
            fifty_two_week_low: price * 0.75,
            fifty_two_week_estimated: true,
        })
    }

    /// 公司概况，对应 /stock/profile2
    async fn get_profile(&self, symbol: &str) -> MarketResult<CompanyProfile> {
        let url = format!("{}/stock/profile2", FINNHUB_API);
        let data = get_json(
            &self.client,
            PROVIDER,
            &url,
            &[("symbol", symbol), ("token", &self.api_key)],
        )
        .await?;

        if data.as_object().map(|m| m.is_empty()).unwrap_or(true) {
            return Err(MarketError::SymbolNotFound(symbol.to_string()));
        }

        Ok(CompanyProfile {
            symbol: symbol.to_string(),
            name: json_str(&data["name"]),
            country: json_str(&data["country"]),
            currency: json_str(&data["currency"]),
            exchange: json_str(&data["exchange"]),
            industry: json_str(&data["finnhubIndustry"]),
            market_capitalization: json_f64(&data["marketCapitalization"]),
            logo: json_str(&data["logo"]),
            weburl: json_str(&data["weburl"]),
        })
    }

    /// K线，对应 /stock/candle；周期代码与 Finnhub 原生一致
    async fn get_candles(
        &self,
        symbol: &str,
        resolution: &str,
        from: i64,
        to: i64,
    ) -> MarketResult<CandleSeries> {
        let url = format!("{}/stock/candle", FINNHUB_API);
        let from_s = from.to_string();
        let to_s = to.to_string();
        let data = get_json(
            &self.client,
            PROVIDER,
            &url,
            &[
                ("symbol", symbol),
                ("resolution", resolution),
                ("from", &from_s),
                ("to", &to_s),
                ("token", &self.api_key),
            ],
        )
        .await?;

        if data["s"].as_str() != Some("ok") {
            return Ok(CandleSeries::no_data());
        }

        let column_i64 = |key: &str| -> Vec<i64> {
            data[key]
                .as_array()
                .map(|a| a.iter().map(|v| v.as_i64().unwrap_or(0)).collect())
                .unwrap_or_default()
        };
        let column_f64 = |key: &str| -> Vec<f64> {
            data[key]
                .as_array()
                .map(|a| a.iter().map(json_f64).collect())
                .unwrap_or_default()
        };
        let column_u64 = |key: &str| -> Vec<u64> {
            data[key]
                .as_array()
                .map(|a| a.iter().map(json_u64).collect())
                .unwrap_or_default()
        };

        Ok(CandleSeries {
            t: column_i64("t"),
            o: column_f64("o"),
            h: column_f64("h"),
            l: column_f64("l"),
            c: column_f64("c"),
            v: column_u64("v"),
            s: CandleStatus::Ok,
        })
    }

    /// 代码搜索，对应 /search
    async fn search_symbols(&self, query: &str) -> MarketResult<Vec<SymbolMatch>> {
        let url = format!("{}/search", FINNHUB_API);
        let data = get_json(
            &self.client,
            PROVIDER,
            &url,
            &[("q", query), ("token", &self.api_key)],
        )
        .await?;

        let results = data["result"].as_array().cloned().unwrap_or_default();
        Ok(results
            .iter()
            .map(|r| SymbolMatch {
                symbol: json_str(&r["symbol"]),
                description: json_str(&r["description"]),
                name: json_str(&r["description"]),
                instrument_type: json_str(&r["type"]),
                exchange: String::new(),
            })
            .collect())
    }

    /// 固定指数列表快照，并发取报价，失败的跳过
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

    async fn get_gainers(&self) -> MarketResult<Vec<MarketMover>> {
        let mut gainers: Vec<MarketMover> = self
            .scan_movers()
            .await
            .into_iter()
            .filter(|m| m.per_change > 0.0)
            .collect();
        gainers.sort_by(|a, b| {
            b.per_change
                .partial_cmp(&a.per_change)
                .unwrap_or(Ordering::Equal)
        });
        gainers.truncate(10);
        Ok(gainers)
    }

    async fn get_losers(&self) -> MarketResult<Vec<MarketMover>> {
        let mut losers: Vec<MarketMover> = self
            .scan_movers()
            .await
            .into_iter()
            .filter(|m| m.per_change < 0.0)
            .collect();
        losers.sort_by(|a, b| {
            a.per_change
                .partial_cmp(&b.per_change)
                .unwrap_or(Ordering::Equal)
        });
        losers.truncate(10);
        Ok(losers)
    }

    /// 个股新闻，对应 /company-news，取最近7天
    async fn get_news(&self, symbol: &str) -> MarketResult<Vec<NewsItem>> {
        let to = Utc::now().date_naive();
        let from = to - Duration::days(7);
        let from_s = from.format("%Y-%m-%d").to_string();
        let to_s = to.format("%Y-%m-%d").to_string();

        let url = format!("{}/company-news", FINNHUB_API);
        let data = get_json(
            &self.client,
            PROVIDER,
            &url,
            &[
                ("symbol", symbol),
                ("from", &from_s),
                ("to", &to_s),
                ("token", &self.api_key),
            ],
        )
        .await?;

        let articles = data.as_array().cloned().unwrap_or_default();
        Ok(articles
            .iter()
            .map(|a| NewsItem {
                id: json_u64(&a["id"]).to_string(),
                category: json_str(&a["category"]),
                datetime: a["datetime"].as_i64().unwrap_or(0),
                headline: json_str(&a["headline"]),
                summary: json_str(&a["summary"]),
                source: json_str(&a["source"]),
                url: json_str(&a["url"]),
                image: json_str(&a["image"]),
                related: json_str(&a["related"]),
                // Finnhub 不提供情绪标签，由服务端补充
                sentiment: None,
            })
            .collect())
    }
}
