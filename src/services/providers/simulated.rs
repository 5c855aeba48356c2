//! 模拟行情数据源（兜底）
//!
//! 多个上游数据源对区域股票要么收费要么直接拒绝，
//! 该数据源维护一张固定股票池的内存行情表，保证系统永远有数据可答，
//! 代价是数据并非真实行情。不做任何网络请求。
//!
//! 行情表由单一写入任务按固定间隔刷新，读写通过 RwLock 隔离

use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::errors::{MarketError, MarketResult};
use crate::models::{
    CandleSeries, CandleStatus, CompanyProfile, IndexSnapshot, MarketMover, NewsItem, StockQuote,
    SymbolMatch,
};
use crate::services::providers::common::{country_for, currency_for, exchange_for};
use crate::services::providers::{Market, MarketProvider};

const PROVIDER: &str = "simulated";

/// 行情刷新间隔
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// K线合成的最大点数
const MAX_CANDLE_POINTS: i64 = 100;

/// 固定股票池：代码、名称、基准价
const UNIVERSE: [(&str, &str, f64); 23] = [
    // 印度市场（NSE）
    ("RELIANCE.NS", "Reliance Industries Ltd", 2800.0),
    ("TCS.NS", "Tata Consultancy Services", 3600.0),
    ("HDFCBANK.NS", "HDFC Bank Limited", 1650.0),
    ("INFY.NS", "Infosys Limited", 1500.0),
    ("HINDUNILVR.NS", "Hindustan Unilever Limited", 2550.0),
    ("ICICIBANK.NS", "ICICI Bank Limited", 980.0),
    ("KOTAKBANK.NS", "Kotak Mahindra Bank", 1780.0),
    ("BHARTIARTL.NS", "Bharti Airtel Limited", 870.0),
    ("ITC.NS", "ITC Limited", 450.0),
    ("SBIN.NS", "State Bank of India", 620.0),
    ("ADANIPORTS.NS", "Adani Ports and SEZ", 1150.0),
    ("WIPRO.NS", "Wipro Limited", 430.0),
    ("MARUTI.NS", "Maruti Suzuki India", 10600.0),
    ("BAJFINANCE.NS", "Bajaj Finance Limited", 7100.0),
    ("NESTLEIND.NS", "Nestle India Limited", 2290.0),
    // 美国市场
    ("AAPL", "Apple Inc.", 190.0),
    ("MSFT", "Microsoft Corporation", 375.0),
    ("GOOGL", "Alphabet Inc.", 140.0),
    ("TSLA", "Tesla Inc.", 250.0),
    ("AMZN", "Amazon.com Inc.", 155.0),
    ("NVDA", "NVIDIA Corporation", 850.0),
    ("META", "Meta Platforms Inc.", 330.0),
    ("NFLX", "Netflix Inc.", 495.0),
];

/// 保留两位小数
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// 模拟行情数据源
pub struct SimulatedMarket {
    /// 行情表，key 为股票代码
    table: RwLock<HashMap<String, StockQuote>>,
}

impl SimulatedMarket {
    /// 初始化行情表：每只股票在基准价 ±2% 内取一个起始价
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        let mut table = HashMap::new();

        for (symbol, name, base) in UNIVERSE {
            let quote = Self::initial_quote(&mut rng, symbol, name, base);
            table.insert(symbol.to_string(), quote);
        }

        Self {
            table: RwLock::new(table),
        }
    }

    fn initial_quote(rng: &mut impl Rng, symbol: &str, name: &str, base: f64) -> StockQuote {
        let volatility = rng.gen_range(-0.02..0.02);
        let price = round2(base * (1.0 + volatility));
        // 涨跌额/涨跌幅由昨收价（基准价）推出，保证内部一致
        let change = price - base;
        let change_percent = change / base * 100.0;

        StockQuote {
            symbol: symbol.to_string(),
            name: name.to_string(),
            price,
            change,
            change_percent,
            high: round2(price * 1.015),
            low: round2(price * 0.985),
            open: round2(base * (1.0 + rng.gen_range(-0.005..0.005))),
            previous_close: base,
            volume: rng.gen_range(1_000_000..11_000_000),
            currency: currency_for(symbol).to_string(),
            exchange: exchange_for(symbol).to_string(),
            fifty_two_week_high: round2(base * 1.25),
            fifty_two_week_low: round2(base * 0.75),
            fifty_two_week_estimated: true,
        }
    }

    /// 启动周期刷新任务（唯一的写入方）
    pub fn spawn_refresh(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
            // interval 的第一次 tick 立即完成
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.refresh().await;
                log::debug!("模拟行情表刷新完成");
            }
        })
    }

    /// 刷新一轮行情：新价格在昨收价 ±1% 内波动，
    /// 当日高低只扩不缩
    pub async fn refresh(&self) {
        let mut table = self.table.write().await;
        let mut rng = rand::thread_rng();

        for quote in table.values_mut() {
            let volatility = rng.gen_range(-0.01..0.01);
            let price = round2(quote.previous_close * (1.0 + volatility));
            quote.price = price;
            quote.change = price - quote.previous_close;
            quote.change_percent = quote.change / quote.previous_close * 100.0;
            quote.high = quote.high.max(price);
            quote.low = quote.low.min(price);
            quote.volume += rng.gen_range(0..100_000);
        }
    }
}

impl Default for SimulatedMarket {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketProvider for SimulatedMarket {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn get_quote(&self, symbol: &str) -> MarketResult<StockQuote> {
        let table = self.table.read().await;
        table
            .get(symbol)
            .cloned()
            .ok_or_else(|| MarketError::SymbolNotFound(symbol.to_string()))
    }

    async fn get_profile(&self, symbol: &str) -> MarketResult<CompanyProfile> {
        let quote = self.get_quote(symbol).await?;

        Ok(CompanyProfile {
            symbol: quote.symbol,
            name: quote.name,
            country: country_for(symbol).to_string(),
            currency: quote.currency,
            exchange: quote.exchange,
            industry: industry_for(symbol).to_string(),
            market_capitalization: market_cap_for(symbol),
            logo: String::new(),
            weburl: String::new(),
        })
    }

    /// 按天合成K线：每个点围绕昨收价 ±3% 独立扰动
    async fn get_candles(
        &self,
        symbol: &str,
        _resolution: &str,
        from: i64,
        to: i64,
    ) -> MarketResult<CandleSeries> {
        let base = {
            let table = self.table.read().await;
            match table.get(symbol) {
                Some(quote) => quote.previous_close,
                None => return Ok(CandleSeries::no_data()),
            }
        };

        let days = (to - from + 86_399) / 86_400;
        let points = days.min(MAX_CANDLE_POINTS);
        if points <= 0 {
            return Ok(CandleSeries::no_data());
        }

        let mut rng = rand::thread_rng();
        let mut candles = CandleSeries::default();

        for i in 0..points {
            let timestamp = from + i * 86_400;
            let open = base * (1.0 + rng.gen_range(-0.03..0.03));
            let close = open * (1.0 + rng.gen_range(-0.02..0.02));
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.02));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.02));

            candles.push(
                timestamp,
                round2(open),
                round2(high),
                round2(low),
                round2(close),
                rng.gen_range(500_000..5_500_000),
            );
        }

        candles.s = CandleStatus::Ok;
        Ok(candles)
    }

    /// 在股票池内做大小写不敏感的子串匹配
    async fn search_symbols(&self, query: &str) -> MarketResult<Vec<SymbolMatch>> {
        let needle = query.to_lowercase();
        let table = self.table.read().await;

        let mut results: Vec<SymbolMatch> = table
            .values()
            .filter(|q| {
                q.symbol.to_lowercase().contains(&needle) || q.name.to_lowercase().contains(&needle)
            })
            .map(|q| SymbolMatch {
                symbol: q.symbol.clone(),
                description: q.name.clone(),
                name: q.name.clone(),
                instrument_type: "Common Stock".to_string(),
                exchange: q.exchange.clone(),
            })
            .collect();

        results.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        results.truncate(10);
        Ok(results)
    }

    /// 固定的印度指数快照
    async fn get_indices(&self) -> MarketResult<Vec<IndexSnapshot>> {
        Ok(vec![
            IndexSnapshot {
                name: "NIFTY 50".to_string(),
                value: 19674.25,
                change: 127.45,
                change_percent: 0.65,
            },
            IndexSnapshot {
                name: "SENSEX".to_string(),
                value: 66795.14,
                change: 421.87,
                change_percent: 0.64,
            },
            IndexSnapshot {
                name: "NIFTY BANK".to_string(),
                value: 45234.50,
                change: 234.75,
                change_percent: 0.52,
            },
            IndexSnapshot {
                name: "NIFTY IT".to_string(),
                value: 32456.80,
                change: -156.20,
                change_percent: -0.48,
            },
        ])
    }

    async fn get_gainers(&self) -> MarketResult<Vec<MarketMover>> {
        let table = self.table.read().await;
        let mut gainers: Vec<MarketMover> = table
            .values()
            .filter(|q| q.change_percent > 0.0 && Market::of(&q.symbol) == Market::India)
            .map(to_mover)
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
        let table = self.table.read().await;
        let mut losers: Vec<MarketMover> = table
            .values()
            .filter(|q| q.change_percent < 0.0 && Market::of(&q.symbol) == Market::India)
            .map(to_mover)
            .collect();
        losers.sort_by(|a, b| {
            a.per_change
                .partial_cmp(&b.per_change)
                .unwrap_or(Ordering::Equal)
        });
        losers.truncate(10);
        Ok(losers)
    }

    /// 模拟数据源不生成新闻
    async fn get_news(&self, _symbol: &str) -> MarketResult<Vec<NewsItem>> {
        Ok(Vec::new())
    }
}

fn to_mover(quote: &StockQuote) -> MarketMover {
    MarketMover {
        symbol: quote.symbol.clone(),
        name: quote.name.clone(),
        ltp: quote.price,
        net_price: quote.change,
        per_change: quote.change_percent,
    }
}

/// 常用代码到行业的映射
fn industry_for(symbol: &str) -> &str {
    match symbol {
        "RELIANCE.NS" => "Oil & Gas",
        "TCS.NS" | "INFY.NS" => "Information Technology",
        "HDFCBANK.NS" | "ICICIBANK.NS" | "KOTAKBANK.NS" | "SBIN.NS" => "Banking",
        "AAPL" | "MSFT" | "GOOGL" => "Technology",
        "TSLA" => "Automotive",
        _ => "Diversified",
    }
}

/// 常用代码到市值的映射
fn market_cap_for(symbol: &str) -> f64 {
    match symbol {
        "RELIANCE.NS" => 18_120_000_000_000.0,
        "TCS.NS" => 13_450_000_000_000.0,
        "AAPL" => 2_980_000_000_000.0,
        "MSFT" => 2_810_000_000_000.0,
        _ => 1_000_000_000_000.0,
    }
}

// ==================== 测试模块 ====================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    /// 测试初始行情表的内部一致性
    #[tokio::test]
    async fn test_initial_quotes_consistent() {
        println!("\n========== 测试初始行情一致性 ==========");
        let market = SimulatedMarket::new();

        for (symbol, _, base) in UNIVERSE {
            let quote = market.get_quote(symbol).await.unwrap();
            assert!(quote.low <= quote.price && quote.price <= quote.high, "{}", symbol);
            assert!((quote.change - (quote.price - quote.previous_close)).abs() < 1e-9);
            assert!(
                (quote.change_percent - quote.change / quote.previous_close * 100.0).abs() < 1e-6
            );
            assert_eq!(quote.previous_close, base);
            assert!(quote.fifty_two_week_estimated);
            assert!(quote.fifty_two_week_low < quote.fifty_two_week_high);
        }
        println!("✅ 初始行情一致性测试通过！");
    }

    /// 测试刷新一轮后的不变量：高低区间只扩不缩，价格落在区间内
    #[tokio::test]
    async fn test_refresh_widens_envelope() {
        println!("\n========== 测试行情刷新 ==========");
        let market = SimulatedMarket::new();

        let before: Vec<StockQuote> = {
            let table = market.table.read().await;
            table.values().cloned().collect()
        };

        market.refresh().await;

        for old in &before {
            let quote = market.get_quote(&old.symbol).await.unwrap();
            assert!(quote.high >= old.high, "{} 最高价收窄", old.symbol);
            assert!(quote.low <= old.low, "{} 最低价收窄", old.symbol);
            assert!(quote.low <= quote.price && quote.price <= quote.high);
            assert!(quote.volume >= old.volume);
            assert!(
                (quote.change_percent - quote.change / quote.previous_close * 100.0).abs() < 1e-6
            );
            // 新价格相对昨收价波动不超过 ±1%
            assert!((quote.price - quote.previous_close).abs() <= quote.previous_close * 0.0101);
        }
        println!("✅ 行情刷新测试通过！");
    }

    /// 测试合成K线的结构不变量
    #[tokio::test]
    async fn test_candles_invariants() {
        println!("\n========== 测试合成K线 ==========");
        let market = SimulatedMarket::new();
        let from = 1_700_000_000;
        let to = from + 30 * 86_400;

        let candles = market.get_candles("TCS.NS", "D", from, to).await.unwrap();
        assert_eq!(candles.s, CandleStatus::Ok);

        let n = candles.len();
        assert!(n > 0 && n <= 100);
        assert_eq!(candles.o.len(), n);
        assert_eq!(candles.h.len(), n);
        assert_eq!(candles.l.len(), n);
        assert_eq!(candles.c.len(), n);
        assert_eq!(candles.v.len(), n);

        for i in 0..n {
            assert!(candles.t[i] >= from && candles.t[i] <= to);
            assert!(candles.h[i] >= candles.o[i].max(candles.c[i]) - 0.01);
            assert!(candles.l[i] <= candles.o[i].min(candles.c[i]) + 0.01);
            if i > 0 {
                assert!(candles.t[i] > candles.t[i - 1], "时间戳必须升序");
            }
        }
        println!("  生成 {} 根K线", n);
        println!("✅ 合成K线测试通过！");
    }

    /// 测试超长窗口K线点数上限为 100
    #[tokio::test]
    async fn test_candles_capped_at_100() {
        let market = SimulatedMarket::new();
        let from = 1_600_000_000;
        let to = from + 365 * 86_400;
        let candles = market.get_candles("AAPL", "D", from, to).await.unwrap();
        assert_eq!(candles.len(), 100);
    }

    /// 测试未知代码返回 no_data / 未找到
    #[tokio::test]
    async fn test_unknown_symbol() {
        let market = SimulatedMarket::new();

        let candles = market.get_candles("NOPE.NS", "D", 0, 86_400).await.unwrap();
        assert_eq!(candles.s, CandleStatus::NoData);
        assert!(candles.is_empty());

        assert!(market.get_quote("NOPE.NS").await.is_err());
    }

    /// 测试搜索：大小写不敏感，最多10条
    #[tokio::test]
    async fn test_search_symbols() {
        println!("\n========== 测试模拟搜索 ==========");
        let market = SimulatedMarket::new();

        let results = market.search_symbols("reliance").await.unwrap();
        assert!(results.iter().any(|r| r.symbol == "RELIANCE.NS"));

        let all = market.search_symbols("a").await.unwrap();
        assert!(all.len() <= 10);

        let none = market.search_symbols("zzzzzz").await.unwrap();
        assert!(none.is_empty());
        println!("✅ 模拟搜索测试通过！");
    }

    /// 测试涨跌幅榜：只含 .NS、排序正确、前10
    #[tokio::test]
    async fn test_movers() {
        println!("\n========== 测试模拟涨跌幅榜 ==========");
        let market = SimulatedMarket::new();

        let gainers = market.get_gainers().await.unwrap();
        assert!(gainers.len() <= 10);
        for pair in gainers.windows(2) {
            assert!(pair[0].per_change >= pair[1].per_change);
        }
        for g in &gainers {
            assert!(g.per_change > 0.0);
            assert!(g.symbol.ends_with(".NS"));
        }

        let losers = market.get_losers().await.unwrap();
        assert!(losers.len() <= 10);
        for pair in losers.windows(2) {
            assert!(pair[0].per_change <= pair[1].per_change);
        }
        for l in &losers {
            assert!(l.per_change < 0.0);
            assert!(l.symbol.ends_with(".NS"));
        }
        println!("✅ 模拟涨跌幅榜测试通过！");
    }

    /// 模拟数据源不访问网络：所有操作必须立即返回
    #[tokio::test]
    async fn test_no_network_blocking() {
        println!("\n========== 测试无网络阻塞 ==========");
        let market = SimulatedMarket::new();
        let budget = Duration::from_millis(200);

        timeout(budget, market.get_quote("AAPL")).await.unwrap().unwrap();
        timeout(budget, market.get_profile("TCS.NS")).await.unwrap().unwrap();
        timeout(budget, market.get_candles("INFY.NS", "D", 0, 30 * 86_400))
            .await
            .unwrap()
            .unwrap();
        timeout(budget, market.search_symbols("bank")).await.unwrap().unwrap();
        timeout(budget, market.get_indices()).await.unwrap().unwrap();
        timeout(budget, market.get_gainers()).await.unwrap().unwrap();
        timeout(budget, market.get_losers()).await.unwrap().unwrap();
        timeout(budget, market.get_news("AAPL")).await.unwrap().unwrap();
        println!("✅ 无网络阻塞测试通过！");
    }
}
