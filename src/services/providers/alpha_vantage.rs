//! Alpha Vantage 数据源适配器
//!
//! 对接 https://www.alphavantage.co/query
//! 免费档限流 5 次/分钟，涨跌幅榜扫描刻意使用串行请求

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use std::cmp::Ordering;

use crate::config::UpstreamConfig;
use crate::errors::{MarketError, MarketResult};
use crate::models::{
    CandleSeries, CandleStatus, CompanyProfile, IndexSnapshot, MarketMover, NewsItem, Sentiment,
    SentimentLabel, StockQuote, SymbolMatch,
};
use crate::services::providers::common::{
    build_client, country_for, currency_for, exchange_for, get_json, json_f64, json_str, json_u64,
    ALPHA_VANTAGE_API,
};
use crate::services::providers::MarketProvider;

const PROVIDER: &str = "alpha_vantage";

/// 固定指数列表：代码与展示名
const INDICES: [(&str, &str); 5] = [
    ("SPY", "S&P 500"),
    ("QQQ", "NASDAQ-100"),
    ("DIA", "Dow Jones"),
    ("NSEI", "NIFTY 50"),
    ("BSESN", "BSE SENSEX"),
];

/// 涨跌幅榜扫描的固定股票池（NSE 权重股）
const MOVER_UNIVERSE: [&str; 15] = [
    "RELIANCE.NS",
    "TCS.NS",
    "HDFCBANK.NS",
    "INFY.NS",
    "HINDUNILVR.NS",
    "HDFC.NS",
    "ICICIBANK.NS",
    "KOTAKBANK.NS",
    "BHARTIARTL.NS",
    "ITC.NS",
    "SBIN.NS",
    "BAJFINANCE.NS",
    "MARUTI.NS",
    "ASIANPAINT.NS",
    "WIPRO.NS",
];

/// Alpha Vantage 适配器
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(upstream: &UpstreamConfig, api_key: String) -> Self {
        Self {
            client: build_client(upstream, false),
            api_key,
        }
    }

    /// 发起一次带 function 参数的查询
    async fn query(&self, params: &[(&str, &str)]) -> MarketResult<serde_json::Value> {
        let data = get_json(&self.client, PROVIDER, ALPHA_VANTAGE_API, params).await?;

        // 免费档超限时返回 200 + Note 字段
        if data.get("Note").is_some() {
            return Err(MarketError::RateLimited(PROVIDER));
        }
        Ok(data)
    }

    /// 串行扫描股票池（限流规避，见模块注释）
    async fn scan_movers(&self) -> Vec<MarketMover> {
        let mut movers = Vec::new();

        for symbol in MOVER_UNIVERSE {
            match self.get_quote(symbol).await {
                Ok(quote) => movers.push(MarketMover {
                    symbol: quote.symbol,
                    name: quote.name,
                    ltp: quote.price,
                    net_price: quote.change,
                    per_change: quote.change_percent,
                }),
                Err(e) => {
                    // 单只失败不终止整个扫描
                    log::warn!("扫描 {} 失败: {}", symbol, e);
                }
            }
        }

        movers
    }
}

#[async_trait]
impl MarketProvider for AlphaVantageClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    /// 实时报价，对应 GLOBAL_QUOTE
    async fn get_quote(&self, symbol: &str) -> MarketResult<StockQuote> {
        let data = self
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", &self.api_key),
            ])
            .await?;

        let quote = &data["Global Quote"];
        if !quote.is_object() || quote.as_object().map(|m| m.is_empty()).unwrap_or(true) {
            return Err(MarketError::SymbolNotFound(symbol.to_string()));
        }

        let price = json_f64(&quote["05. price"]);
        let previous_close = json_f64(&quote["08. previous close"]);
        // 涨跌额/涨跌幅由昨收价重算，保证内部一致
        let change = if previous_close > 0.0 { price - previous_close } else { 0.0 };
        let change_percent = if previous_close > 0.0 { change / previous_close * 100.0 } else { 0.0 };

        Ok(StockQuote {
            symbol: symbol.to_string(),
            name: company_name(symbol),
            price,
            change,
            change_percent,
            high: json_f64(&quote["03. high"]),
            low: json_f64(&quote["04. low"]),
            open: json_f64(&quote["02. open"]),
            previous_close,
            volume: json_u64(&quote["06. volume"]),
            currency: currency_for(symbol).to_string(),
            exchange: exchange_for(symbol).to_string(),
            // 接口不提供52周高低，按最新价 ±25% 估算
            fifty_two_week_high: price * 1.25,
            fifty_two_week_low: price * 0.75,
            fifty_two_week_estimated: true,
        })
    }

    /// 公司概况，对应 OVERVIEW
    async fn get_profile(&self, symbol: &str) -> MarketResult<CompanyProfile> {
        let overview = self
            .query(&[
                ("function", "OVERVIEW"),
                ("symbol", symbol),
                ("apikey", &self.api_key),
            ])
            .await?;

        let name = match overview["Name"].as_str() {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => company_name(symbol),
        };

        Ok(CompanyProfile {
            symbol: symbol.to_string(),
            name,
            country: match overview["Country"].as_str() {
                Some(c) if !c.is_empty() => c.to_string(),
                _ => country_for(symbol).to_string(),
            },
            currency: match overview["Currency"].as_str() {
                Some(c) if !c.is_empty() => c.to_string(),
                _ => currency_for(symbol).to_string(),
            },
            exchange: match overview["Exchange"].as_str() {
                Some(e) if !e.is_empty() => e.to_string(),
                _ => exchange_for(symbol).to_string(),
            },
            industry: json_str(&overview["Industry"]),
            market_capitalization: json_f64(&overview["MarketCapitalization"]),
            logo: String::new(),
            weburl: json_str(&overview["OfficialSite"]),
        })
    }

    /// 日K线，对应 TIME_SERIES_DAILY，按 [from, to] 过滤
    async fn get_candles(
        &self,
        symbol: &str,
        _resolution: &str,
        from: i64,
        to: i64,
    ) -> MarketResult<CandleSeries> {
        let data = self
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("apikey", &self.api_key),
                ("outputsize", "full"),
            ])
            .await?;

        let series = data["Time Series (Daily)"]
            .as_object()
            .ok_or_else(|| MarketError::upstream(PROVIDER, "无K线数据"))?;

        // 日期键升序排列后按区间过滤
        let mut dates: Vec<&String> = series.keys().collect();
        dates.sort();

        let mut candles = CandleSeries::default();
        for date in dates {
            let ts = match NaiveDateTime::parse_from_str(
                &format!("{} 00:00:00", date),
                "%Y-%m-%d %H:%M:%S",
            ) {
                Ok(dt) => dt.and_utc().timestamp(),
                Err(_) => continue,
            };
            if ts < from || ts > to {
                continue;
            }

            let row = &series[date.as_str()];
            candles.push(
                ts,
                json_f64(&row["1. open"]),
                json_f64(&row["2. high"]),
                json_f64(&row["3. low"]),
                json_f64(&row["4. close"]),
                json_u64(&row["5. volume"]),
            );
        }

        if candles.is_empty() {
            return Ok(CandleSeries::no_data());
        }
        candles.s = CandleStatus::Ok;
        Ok(candles)
    }

    /// 代码搜索，对应 SYMBOL_SEARCH，保持匹配度降序
    async fn search_symbols(&self, query: &str) -> MarketResult<Vec<SymbolMatch>> {
        let data = self
            .query(&[
                ("function", "SYMBOL_SEARCH"),
                ("keywords", query),
                ("apikey", &self.api_key),
            ])
            .await?;

        let matches = data["bestMatches"].as_array().cloned().unwrap_or_default();
        Ok(matches
            .iter()
            .map(|m| SymbolMatch {
                symbol: json_str(&m["1. symbol"]),
                description: json_str(&m["2. name"]),
                name: json_str(&m["2. name"]),
                instrument_type: json_str(&m["3. type"]),
                exchange: json_str(&m["4. region"]),
            })
            .collect())
    }

    /// 固定指数列表快照，逐个取报价，失败的跳过
    async fn get_indices(&self) -> MarketResult<Vec<IndexSnapshot>> {
        let mut snapshots = Vec::new();

        for (symbol, name) in INDICES {
            match self.get_quote(symbol).await {
                Ok(quote) => snapshots.push(IndexSnapshot {
                    name: name.to_string(),
                    value: quote.price,
                    change: quote.change,
                    change_percent: quote.change_percent,
                }),
                Err(e) => {
                    log::warn!("获取指数 {} 失败: {}", symbol, e);
                }
            }
        }

        Ok(snapshots)
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

    /// 个股新闻，对应 NEWS_SENTIMENT，自带情绪标签原样透传
    async fn get_news(&self, symbol: &str) -> MarketResult<Vec<NewsItem>> {
        let data = self
            .query(&[
                ("function", "NEWS_SENTIMENT"),
                ("tickers", symbol),
                ("apikey", &self.api_key),
                ("limit", "50"),
            ])
            .await?;

        let feed = data["feed"].as_array().cloned().unwrap_or_default();
        Ok(feed
            .iter()
            .map(|article| {
                let url = json_str(&article["url"]);
                let id = url.rsplit('/').find(|s| !s.is_empty()).unwrap_or("").to_string();

                NewsItem {
                    id,
                    category: "general".to_string(),
                    datetime: parse_news_time(&json_str(&article["time_published"])),
                    headline: json_str(&article["title"]),
                    summary: json_str(&article["summary"]),
                    source: json_str(&article["source"]),
                    url,
                    image: json_str(&article["banner_image"]),
                    related: symbol.to_string(),
                    sentiment: Some(Sentiment {
                        sentiment: map_sentiment_label(&json_str(
                            &article["overall_sentiment_label"],
                        )),
                        score: json_f64(&article["overall_sentiment_score"]),
                    }),
                }
            })
            .collect())
    }
}

/// 解析新闻时间戳（格式 20240101T123000）
fn parse_news_time(raw: &str) -> i64 {
    NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%S")
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}

/// 把 Alpha Vantage 的情绪标签归并到三分类
fn map_sentiment_label(label: &str) -> SentimentLabel {
    let label = label.to_lowercase();
    if label.contains("bullish") || label == "positive" {
        SentimentLabel::Positive
    } else if label.contains("bearish") || label == "negative" {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// 常用代码到公司名的映射（接口不返回名称时使用）
fn company_name(symbol: &str) -> String {
    let name = match symbol {
        "RELIANCE.NS" => "Reliance Industries Ltd",
        "TCS.NS" => "Tata Consultancy Services",
        "HDFCBANK.NS" => "HDFC Bank Limited",
        "INFY.NS" => "Infosys Limited",
        "HINDUNILVR.NS" => "Hindustan Unilever Limited",
        "HDFC.NS" => "Housing Development Finance Corporation",
        "ICICIBANK.NS" => "ICICI Bank Limited",
        "KOTAKBANK.NS" => "Kotak Mahindra Bank Limited",
        "BHARTIARTL.NS" => "Bharti Airtel Limited",
        "ITC.NS" => "ITC Limited",
        "SBIN.NS" => "State Bank of India",
        "BAJFINANCE.NS" => "Bajaj Finance Limited",
        "MARUTI.NS" => "Maruti Suzuki India Limited",
        "ASIANPAINT.NS" => "Asian Paints Limited",
        "WIPRO.NS" => "Wipro Limited",
        "AAPL" => "Apple Inc.",
        "MSFT" => "Microsoft Corporation",
        "GOOGL" => "Alphabet Inc.",
        "AMZN" => "Amazon.com Inc.",
        "TSLA" => "Tesla Inc.",
        "SPY" => "SPDR S&P 500 ETF",
        "QQQ" => "Invesco QQQ Trust",
        "DIA" => "SPDR Dow Jones Industrial Average ETF",
        _ => symbol,
    };
    name.to_string()
}

// ==================== 测试模块 ====================

#[cfg(test)]
mod tests {
    use super::*;

    /// 测试新闻时间戳解析
    #[test]
    fn test_parse_news_time() {
        println!("\n========== 测试新闻时间戳解析 ==========");
        let ts = parse_news_time("20240315T093000");
        println!("  20240315T093000 -> {}", ts);
        assert_eq!(ts, 1710495000);
        assert_eq!(parse_news_time("garbage"), 0);
        println!("✅ 新闻时间戳解析测试通过！");
    }

    /// 测试情绪标签归并
    #[test]
    fn test_map_sentiment_label() {
        assert_eq!(map_sentiment_label("Bullish"), SentimentLabel::Positive);
        assert_eq!(map_sentiment_label("Somewhat-Bullish"), SentimentLabel::Positive);
        assert_eq!(map_sentiment_label("Bearish"), SentimentLabel::Negative);
        assert_eq!(map_sentiment_label("Neutral"), SentimentLabel::Neutral);
        assert_eq!(map_sentiment_label(""), SentimentLabel::Neutral);
    }

    /// 测试公司名映射
    #[test]
    fn test_company_name() {
        assert_eq!(company_name("AAPL"), "Apple Inc.");
        assert_eq!(company_name("UNKNOWN"), "UNKNOWN");
    }
}
