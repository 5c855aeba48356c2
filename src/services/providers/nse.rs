//! NSE（印度国家证券交易所）数据源适配器
//!
//! 对接 https://www.nseindia.com/api
//! 该站点拒绝无会话 Cookie 的请求，首次调用前先访问首页预热；
//! 不提供K线和新闻能力

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION};
use reqwest::Client;
use std::cmp::Ordering;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::UpstreamConfig;
use crate::errors::{MarketError, MarketResult};
use crate::models::{
    CandleSeries, CompanyProfile, IndexSnapshot, MarketMover, NewsItem, StockQuote, SymbolMatch,
};
use crate::services::providers::common::{
    get_json, json_f64, json_str, json_u64, BROWSER_USER_AGENT, NSE_API, NSE_HOME_URL,
};
use crate::services::providers::MarketProvider;

const PROVIDER: &str = "nse";

/// NSE 适配器
pub struct NseClient {
    client: Client,
    /// 会话 Cookie 预热标记，进程内只做一次
    primed: OnceCell<()>,
}

impl NseClient {
    pub fn new(upstream: &UpstreamConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = Client::builder()
            .timeout(Duration::from_secs(upstream.timeout_secs))
            .connect_timeout(Duration::from_secs(upstream.connect_timeout_secs))
            .cookie_store(true)
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .build()
            .unwrap_or_default();

        Self {
            client,
            primed: OnceCell::new(),
        }
    }

    /// 访问站点首页获取会话 Cookie
    async fn prime_session(&self) {
        self.primed
            .get_or_init(|| async {
                if let Err(e) = self.client.get(NSE_HOME_URL).send().await {
                    log::warn!("NSE 会话预热失败: {}", e);
                }
            })
            .await;
    }

    /// 榜单接口通用请求
    async fn fetch_variations(&self, kind: &str) -> MarketResult<Vec<MarketMover>> {
        self.prime_session().await;
        let url = format!("{}/live-analysis-{}", NSE_API, kind);
        let data = get_json(&self.client, PROVIDER, &url, &[("index", kind)]).await?;

        let rows = data["data"].as_array().cloned().unwrap_or_default();
        Ok(rows
            .iter()
            .map(|row| MarketMover {
                // NSE 返回裸代码，补回 .NS 后缀保持全站代码约定一致
                symbol: format!("{}.NS", json_str(&row["symbol"])),
                name: json_str(&row["symbol"]),
                ltp: json_f64(&row["ltp"]),
                net_price: json_f64(&row["netPrice"]),
                per_change: json_f64(&row["perChange"]),
            })
            .collect())
    }
}

#[async_trait]
impl MarketProvider for NseClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    /// 实时报价，对应 /quote-equity（代码去掉 .NS 后缀）
    async fn get_quote(&self, symbol: &str) -> MarketResult<StockQuote> {
        self.prime_session().await;
        let plain = symbol.trim_end_matches(".NS");
        let url = format!("{}/quote-equity", NSE_API);
        let data = get_json(&self.client, PROVIDER, &url, &[("symbol", plain)]).await?;

        let info = &data["info"];
        let price_info = &data["priceInfo"];
        if !price_info.is_object() {
            return Err(MarketError::SymbolNotFound(symbol.to_string()));
        }

        let price = json_f64(&price_info["lastPrice"]);
        let previous_close = json_f64(&price_info["previousClose"]);
        let change = if previous_close > 0.0 { price - previous_close } else { 0.0 };
        let change_percent = if previous_close > 0.0 { change / previous_close * 100.0 } else { 0.0 };

        Ok(StockQuote {
            symbol: symbol.to_string(),
            name: json_str(&info["companyName"]),
            price,
            change,
            change_percent,
            high: json_f64(&price_info["intraDayHighLow"]["max"]),
            low: json_f64(&price_info["intraDayHighLow"]["min"]),
            open: json_f64(&price_info["open"]),
            previous_close,
            volume: json_u64(&data["securityWiseDP"]["quantityTraded"]),
            currency: "INR".to_string(),
            exchange: "NSE".to_string(),
            // NSE 提供真实的52周高低
            fifty_two_week_high: json_f64(&price_info["weekHighLow"]["max"]),
            fifty_two_week_low: json_f64(&price_info["weekHighLow"]["min"]),
            fifty_two_week_estimated: false,
        })
    }

    /// 概况由报价接口合成（NSE 无独立概况接口）
    async fn get_profile(&self, symbol: &str) -> MarketResult<CompanyProfile> {
        self.prime_session().await;
        let plain = symbol.trim_end_matches(".NS");
        let url = format!("{}/quote-equity", NSE_API);
        let data = get_json(&self.client, PROVIDER, &url, &[("symbol", plain)]).await?;

        let info = &data["info"];
        if !info.is_object() {
            return Err(MarketError::SymbolNotFound(symbol.to_string()));
        }

        Ok(CompanyProfile {
            symbol: symbol.to_string(),
            name: json_str(&info["companyName"]),
            country: "India".to_string(),
            currency: "INR".to_string(),
            exchange: "NSE".to_string(),
            industry: json_str(&info["industry"]),
            market_capitalization: 0.0,
            logo: String::new(),
            weburl: String::new(),
        })
    }

    /// NSE 不提供K线能力，返回空序列
    async fn get_candles(
        &self,
        _symbol: &str,
        _resolution: &str,
        _from: i64,
        _to: i64,
    ) -> MarketResult<CandleSeries> {
        Ok(CandleSeries::no_data())
    }

    /// 代码搜索，对应 /search/autocomplete
    async fn search_symbols(&self, query: &str) -> MarketResult<Vec<SymbolMatch>> {
        self.prime_session().await;
        let url = format!("{}/search/autocomplete", NSE_API);
        let data = get_json(&self.client, PROVIDER, &url, &[("q", query)]).await?;

        let symbols = data["symbols"].as_array().cloned().unwrap_or_default();
        Ok(symbols
            .iter()
            .map(|s| SymbolMatch {
                symbol: format!("{}.NS", json_str(&s["symbol"])),
                description: json_str(&s["symbol_info"]),
                name: json_str(&s["symbol_info"]),
                instrument_type: json_str(&s["result_sub_type"]),
                exchange: "NSE".to_string(),
            })
            .collect())
    }

    /// 全部指数快照，对应 /allIndices
    async fn get_indices(&self) -> MarketResult<Vec<IndexSnapshot>> {
        self.prime_session().await;
        let url = format!("{}/allIndices", NSE_API);
        let data = get_json(&self.client, PROVIDER, &url, &[]).await?;

        let rows = data["data"].as_array().cloned().unwrap_or_default();
        Ok(rows
            .iter()
            .map(|row| IndexSnapshot {
                name: json_str(&row["index"]),
                value: json_f64(&row["last"]),
                change: json_f64(&row["variation"]),
                change_percent: json_f64(&row["percentChange"]),
            })
            .collect())
    }

    async fn get_gainers(&self) -> MarketResult<Vec<MarketMover>> {
        let mut gainers: Vec<MarketMover> = self
            .fetch_variations("gainers")
            .await?
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
            .fetch_variations("losers")
            .await?
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

    /// NSE 不提供新闻能力，返回空列表
    async fn get_news(&self, _symbol: &str) -> MarketResult<Vec<NewsItem>> {
        Ok(Vec::new())
    }
}
