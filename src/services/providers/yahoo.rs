//! Yahoo Finance 数据源适配器
//!
//! 对接 query1.finance.yahoo.com（无需 API Key）
//! 提供报价、概况、K线、搜索；指数和榜单按固定 NIFTY 股票池扫描

use async_trait::async_trait;
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
    build_client, get_json, json_f64, json_str, json_u64, YAHOO_CHART_API, YAHOO_QUOTE_API,
    YAHOO_SEARCH_API,
};
use crate::services::providers::MarketProvider;

const PROVIDER: &str = "yahoo";

/// 固定指数列表（印度市场）
const INDICES: [&str; 6] = ["^NSEI", "^BSESN", "^NSEBANK", "^CNXIT", "^NSEPHARMA", "^CNXFMCG"];

/// 涨跌幅榜扫描的固定股票池（NIFTY 权重股）
const MOVER_UNIVERSE: [&str; 20] = [
    "RELIANCE.NS",
    "TCS.NS",
    "HDFCBANK.NS",
    "INFY.NS",
    "HINDUNILVR.NS",
    "ICICIBANK.NS",
    "KOTAKBANK.NS",
    "SBIN.NS",
    "BHARTIARTL.NS",
    "ITC.NS",
    "ASIANPAINT.NS",
    "LT.NS",
    "AXISBANK.NS",
    "MARUTI.NS",
    "SUNPHARMA.NS",
    "TITAN.NS",
    "ULTRACEMCO.NS",
    "NESTLEIND.NS",
    "WIPRO.NS",
    "M&M.NS",
];

/// Yahoo Finance 适配器
pub struct YahooClient {
    client: Client,
}

impl YahooClient {
    pub fn new(upstream: &UpstreamConfig) -> Self {
        Self {
            client: build_client(upstream, false),
        }
    }

    /// 把内部周期代码映射为 Yahoo 的 interval 词汇
    fn map_interval(resolution: &str) -> &'static str {
        match resolution {
            "5" => "5m",
            "15" => "15m",
            "30" => "30m",
            "60" => "1h",
            _ => "1d",
        }
    }

    /// 并发扫描股票池，单只失败跳过
    async fn scan_movers(&self) -> Vec<MarketMover> {
        let tasks = MOVER_UNIVERSE.iter().map(|symbol| async move {
            match self.get_quote(symbol).await {
                Ok(quote) => Some(MarketMover {
                    symbol: quote.symbol,
                    name: quote.name,
                    ltp: quote.price,
                    net_price: quote.change,
                    per_change: quote.change_percent,
                }),
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
impl MarketProvider for YahooClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    /// 实时报价，对应 v7 quote 接口
    async fn get_quote(&self, symbol: &str) -> MarketResult<StockQuote> {
        let data = get_json(&self.client, PROVIDER, YAHOO_QUOTE_API, &[("symbols", symbol)]).await?;

        let quote = &data["quoteResponse"]["result"][0];
        if !quote.is_object() {
            return Err(MarketError::SymbolNotFound(symbol.to_string()));
        }

        let price = json_f64(&quote["regularMarketPrice"]);
        let previous_close = json_f64(&quote["regularMarketPreviousClose"]);
        let change = if previous_close > 0.0 { price - previous_close } else { 0.0 };
        let change_percent = if previous_close > 0.0 { change / previous_close * 100.0 } else { 0.0 };

        let name = match quote["longName"].as_str() {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => json_str(&quote["shortName"]),
        };
        let exchange = match quote["fullExchangeName"].as_str() {
            Some(e) if !e.is_empty() => e.to_string(),
            _ => json_str(&quote["exchange"]),
        };

        Ok(StockQuote {
            symbol: json_str(&quote["symbol"]),
            name,
            price,
            change,
            change_percent,
            high: json_f64(&quote["regularMarketDayHigh"]),
            low: json_f64(&quote["regularMarketDayLow"]),
            open: json_f64(&quote["regularMarketOpen"]),
            previous_close,
            volume: json_u64(&quote["regularMarketVolume"]),
            currency: {
                let c = json_str(&quote["currency"]);
                if c.is_empty() { "USD".to_string() } else { c }
            },
            exchange,
            fifty_two_week_high: json_f64(&quote["fiftyTwoWeekHigh"]),
            fifty_two_week_low: json_f64(&quote["fiftyTwoWeekLow"]),
            fifty_two_week_estimated: false,
        })
    }

    /// 概况由报价接口字段合成
    async fn get_profile(&self, symbol: &str) -> MarketResult<CompanyProfile> {
        let data = get_json(&self.client, PROVIDER, YAHOO_QUOTE_API, &[("symbols", symbol)]).await?;

        let quote = &data["quoteResponse"]["result"][0];
        if !quote.is_object() {
            return Err(MarketError::SymbolNotFound(symbol.to_string()));
        }

        let name = match quote["longName"].as_str() {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => json_str(&quote["shortName"]),
        };
        let exchange = match quote["fullExchangeName"].as_str() {
            Some(e) if !e.is_empty() => e.to_string(),
            _ => json_str(&quote["exchange"]),
        };

        Ok(CompanyProfile {
            symbol: json_str(&quote["symbol"]),
            name,
            country: json_str(&quote["country"]),
            currency: {
                let c = json_str(&quote["currency"]);
                if c.is_empty() { "USD".to_string() } else { c }
            },
            exchange,
            industry: json_str(&quote["sector"]),
            market_capitalization: json_f64(&quote["marketCap"]),
            logo: String::new(),
            weburl: String::new(),
        })
    }

    /// K线，对应 v8 chart 接口
    async fn get_candles(
        &self,
        symbol: &str,
        resolution: &str,
        from: i64,
        to: i64,
    ) -> MarketResult<CandleSeries> {
        let url = format!("{}/{}", YAHOO_CHART_API, symbol);
        let from_s = from.to_string();
        let to_s = to.to_string();
        let data = get_json(
            &self.client,
            PROVIDER,
            &url,
            &[
                ("period1", from_s.as_str()),
                ("period2", to_s.as_str()),
                ("interval", Self::map_interval(resolution)),
                ("includePrePost", "false"),
                ("events", "div,splits"),
            ],
        )
        .await?;

        let chart = &data["chart"]["result"][0];
        let timestamps = match chart["timestamp"].as_array() {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(CandleSeries::no_data()),
        };
        let quote = &chart["indicators"]["quote"][0];

        let mut candles = CandleSeries::default();
        for (i, ts) in timestamps.iter().enumerate() {
            candles.push(
                ts.as_i64().unwrap_or(0),
                json_f64(&quote["open"][i]),
                json_f64(&quote["high"][i]),
                json_f64(&quote["low"][i]),
                json_f64(&quote["close"][i]),
                json_u64(&quote["volume"][i]),
            );
        }
        candles.s = CandleStatus::Ok;
        Ok(candles)
    }

    /// 代码搜索，对应 v1 search 接口
    async fn search_symbols(&self, query: &str) -> MarketResult<Vec<SymbolMatch>> {
        let data = get_json(&self.client, PROVIDER, YAHOO_SEARCH_API, &[("q", query)]).await?;

        let results = data["quotes"].as_array().cloned().unwrap_or_default();
        Ok(results
            .iter()
            .map(|r| {
                let name = match r["longname"].as_str() {
                    Some(n) if !n.is_empty() => n.to_string(),
                    _ => json_str(&r["shortname"]),
                };
                SymbolMatch {
                    symbol: json_str(&r["symbol"]),
                    description: name.clone(),
                    name,
                    instrument_type: json_str(&r["typeDisp"]),
                    exchange: json_str(&r["exchDisp"]),
                }
            })
            .collect())
    }

    /// 印度指数快照，并发取报价，失败的跳过
    async fn get_indices(&self) -> MarketResult<Vec<IndexSnapshot>> {
        let tasks = INDICES.iter().map(|symbol| async move {
            match self.get_quote(symbol).await {
                Ok(quote) => Some(IndexSnapshot {
                    name: index_name(symbol).to_string(),
                    value: quote.price,
                    change: quote.change,
                    change_percent: quote.change_percent,
                }),
                Err(e) => {
                    log::warn!("获取指数 {} 失败: {}", symbol, e);
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

    /// Yahoo 不提供结构化新闻接口，返回空列表
    async fn get_news(&self, _symbol: &str) -> MarketResult<Vec<NewsItem>> {
        Ok(Vec::new())
    }
}

/// 指数代码到展示名的映射
fn index_name(symbol: &str) -> &str {
    match symbol {
        "^NSEI" => "NIFTY 50",
        "^BSESN" => "SENSEX",
        "^NSEBANK" => "NIFTY BANK",
        "^CNXIT" => "NIFTY IT",
        "^NSEPHARMA" => "NIFTY PHARMA",
        "^CNXFMCG" => "NIFTY FMCG",
        other => other,
    }
}

// ==================== 测试模块 ====================

#[cfg(test)]
mod tests {
    use super::*;

    /// 测试周期代码映射
    #[test]
    fn test_map_interval() {
        println!("\n========== 测试周期代码映射 ==========");
        let cases = vec![
            ("5", "5m"),
            ("15", "15m"),
            ("30", "30m"),
            ("60", "1h"),
            ("D", "1d"),
            ("unknown", "1d"),
        ];
        for (input, expected) in &cases {
            let result = YahooClient::map_interval(input);
            println!("  {} -> {}", input, result);
            assert_eq!(result, *expected);
        }
        println!("✅ 周期代码映射测试通过！");
    }

    /// 测试指数名称映射
    #[test]
    fn test_index_name() {
        assert_eq!(index_name("^NSEI"), "NIFTY 50");
        assert_eq!(index_name("^BSESN"), "SENSEX");
        assert_eq!(index_name("^UNKNOWN"), "^UNKNOWN");
    }
}
