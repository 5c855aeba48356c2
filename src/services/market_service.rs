//! 行情聚合服务
//!
//! 按市场分类把单源请求路由到对应的数据源调用链，
//! 链上全部失败时落到模拟数据源兜底；
//! 多源请求（搜索、指数）并发调用全部数据源，按声明顺序合并成功结果

use futures::future::join_all;
use std::sync::Arc;

use crate::config::{ProviderKeys, UpstreamConfig};
use crate::errors::MarketResult;
use crate::models::{
    CandleSeries, CandleStatus, CompanyProfile, IndexSnapshot, MarketMover, NewsItem, StockQuote,
    SymbolMatch,
};
use crate::services::providers::{
    AlphaVantageClient, FinnhubClient, Market, MarketProvider, NseClient, SimulatedMarket,
    TwelveDataClient, YahooClient,
};

/// 行情聚合服务
///
/// 无内部状态，每次调用幂等；不缓存、不合并并发的相同请求
pub struct HybridMarketService {
    /// 印度市场单源调用链
    india_chain: Vec<Arc<dyn MarketProvider>>,
    /// 全球市场单源调用链
    global_chain: Vec<Arc<dyn MarketProvider>>,
    /// 多源操作的数据源列表（声明顺序即合并顺序）
    all_providers: Vec<Arc<dyn MarketProvider>>,
    /// 涨跌幅榜指定数据源（区域性需求，不做合并）
    movers_provider: Arc<dyn MarketProvider>,
    /// 兜底数据源
    fallback: Arc<SimulatedMarket>,
}

impl HybridMarketService {
    /// 按默认路由表构建：
    /// 印度市场走 NSE → Yahoo，全球市场走 Alpha Vantage → Finnhub → Twelve Data，
    /// 两条链兜底都是模拟数据源
    pub fn new(
        upstream: &UpstreamConfig,
        keys: &ProviderKeys,
        simulated: Arc<SimulatedMarket>,
    ) -> Self {
        let alpha_vantage: Arc<dyn MarketProvider> =
            Arc::new(AlphaVantageClient::new(upstream, keys.alpha_vantage.clone()));
        let finnhub: Arc<dyn MarketProvider> =
            Arc::new(FinnhubClient::new(upstream, keys.finnhub.clone()));
        let nse: Arc<dyn MarketProvider> = Arc::new(NseClient::new(upstream));
        let yahoo: Arc<dyn MarketProvider> = Arc::new(YahooClient::new(upstream));
        let twelve_data: Arc<dyn MarketProvider> =
            Arc::new(TwelveDataClient::new(upstream, keys.twelve_data.clone()));

        Self::from_parts(
            vec![Arc::clone(&nse), Arc::clone(&yahoo)],
            vec![
                Arc::clone(&alpha_vantage),
                Arc::clone(&finnhub),
                Arc::clone(&twelve_data),
            ],
            vec![
                alpha_vantage,
                finnhub,
                Arc::clone(&nse),
                yahoo,
                twelve_data,
                Arc::clone(&simulated) as Arc<dyn MarketProvider>,
            ],
            nse,
            simulated,
        )
    }

    /// 按显式路由表构建（测试时注入假数据源）
    pub fn from_parts(
        india_chain: Vec<Arc<dyn MarketProvider>>,
        global_chain: Vec<Arc<dyn MarketProvider>>,
        all_providers: Vec<Arc<dyn MarketProvider>>,
        movers_provider: Arc<dyn MarketProvider>,
        fallback: Arc<SimulatedMarket>,
    ) -> Self {
        Self {
            india_chain,
            global_chain,
            all_providers,
            movers_provider,
            fallback,
        }
    }

    /// 市场分类到调用链的固定映射
    fn chain_for(&self, symbol: &str) -> &[Arc<dyn MarketProvider>] {
        match Market::of(symbol) {
            Market::India => &self.india_chain,
            Market::Global => &self.global_chain,
        }
    }

    /// 获取单只股票报价：沿调用链取第一个成功结果，全败则兜底
    pub async fn get_quote(&self, symbol: &str) -> MarketResult<StockQuote> {
        for provider in self.chain_for(symbol) {
            match provider.get_quote(symbol).await {
                Ok(quote) => return Ok(quote),
                Err(e) => {
                    log::warn!("{} 获取 {} 报价失败: {}", provider.name(), symbol, e);
                }
            }
        }
        self.fallback.get_quote(symbol).await
    }

    /// 获取公司概况：沿调用链取第一个成功结果，全败则兜底
    pub async fn get_profile(&self, symbol: &str) -> MarketResult<CompanyProfile> {
        for provider in self.chain_for(symbol) {
            match provider.get_profile(symbol).await {
                Ok(profile) => return Ok(profile),
                Err(e) => {
                    log::warn!("{} 获取 {} 概况失败: {}", provider.name(), symbol, e);
                }
            }
        }
        self.fallback.get_profile(symbol).await
    }

    /// 获取K线：空序列视同失败继续沿链尝试，最终由模拟数据源合成
    pub async fn get_candles(
        &self,
        symbol: &str,
        resolution: &str,
        from: i64,
        to: i64,
    ) -> MarketResult<CandleSeries> {
        for provider in self.chain_for(symbol) {
            match provider.get_candles(symbol, resolution, from, to).await {
                Ok(series) if series.s == CandleStatus::Ok && !series.is_empty() => {
                    return Ok(series)
                }
                Ok(_) => {
                    log::debug!("{} 无 {} 的K线数据", provider.name(), symbol);
                }
                Err(e) => {
                    log::warn!("{} 获取 {} K线失败: {}", provider.name(), symbol, e);
                }
            }
        }
        self.fallback.get_candles(symbol, resolution, from, to).await
    }

    /// 获取个股新闻：取链上第一个非空结果，否则返回空列表
    pub async fn get_news(&self, symbol: &str) -> Vec<NewsItem> {
        for provider in self.chain_for(symbol) {
            match provider.get_news(symbol).await {
                Ok(items) if !items.is_empty() => return items,
                Ok(_) => {
                    log::debug!("{} 无 {} 的新闻", provider.name(), symbol);
                }
                Err(e) => {
                    log::warn!("{} 获取 {} 新闻失败: {}", provider.name(), symbol, e);
                }
            }
        }
        Vec::new()
    }

    /// 多源搜索：并发调用全部数据源，任一失败不影响其余，
    /// 成功结果按数据源声明顺序拼接
    pub async fn search_symbols(&self, query: &str) -> Vec<SymbolMatch> {
        let tasks = self.all_providers.iter().map(|provider| async move {
            (provider.name(), provider.search_symbols(query).await)
        });

        let mut merged = Vec::new();
        for (name, outcome) in join_all(tasks).await {
            match outcome {
                Ok(items) => merged.extend(items),
                Err(e) => log::warn!("{} 搜索失败: {}", name, e),
            }
        }
        merged
    }

    /// 多源指数快照：并发调用全部数据源，合并成功结果
    pub async fn get_indices(&self) -> Vec<IndexSnapshot> {
        let tasks = self.all_providers.iter().map(|provider| async move {
            (provider.name(), provider.get_indices().await)
        });

        let mut merged = Vec::new();
        for (name, outcome) in join_all(tasks).await {
            match outcome {
                Ok(items) => merged.extend(items),
                Err(e) => log::warn!("{} 获取指数失败: {}", name, e),
            }
        }
        merged
    }

    /// 涨幅榜：指定区域数据源，失败或无数据时兜底
    pub async fn get_gainers(&self) -> Vec<MarketMover> {
        match self.movers_provider.get_gainers().await {
            Ok(items) if !items.is_empty() => items,
            Ok(_) => {
                log::debug!("{} 涨幅榜为空，使用模拟数据", self.movers_provider.name());
                self.fallback.get_gainers().await.unwrap_or_default()
            }
            Err(e) => {
                log::warn!("{} 获取涨幅榜失败: {}", self.movers_provider.name(), e);
                self.fallback.get_gainers().await.unwrap_or_default()
            }
        }
    }

    /// 跌幅榜：指定区域数据源，失败或无数据时兜底
    pub async fn get_losers(&self) -> Vec<MarketMover> {
        match self.movers_provider.get_losers().await {
            Ok(items) if !items.is_empty() => items,
            Ok(_) => {
                log::debug!("{} 跌幅榜为空，使用模拟数据", self.movers_provider.name());
                self.fallback.get_losers().await.unwrap_or_default()
            }
            Err(e) => {
                log::warn!("{} 获取跌幅榜失败: {}", self.movers_provider.name(), e);
                self.fallback.get_losers().await.unwrap_or_default()
            }
        }
    }
}

// ==================== 测试模块 ====================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::errors::MarketError;

    /// 可配置成功/失败的假数据源
    struct FakeProvider {
        label: &'static str,
        fail: bool,
    }

    impl FakeProvider {
        fn ok(label: &'static str) -> Arc<dyn MarketProvider> {
            Arc::new(Self { label, fail: false })
        }

        fn failing(label: &'static str) -> Arc<dyn MarketProvider> {
            Arc::new(Self { label, fail: true })
        }

        fn guard(&self) -> MarketResult<()> {
            if self.fail {
                Err(MarketError::upstream(self.label, "下线"))
            } else {
                Ok(())
            }
        }

        fn quote(&self, symbol: &str) -> StockQuote {
            StockQuote {
                symbol: symbol.to_string(),
                name: format!("{} via {}", symbol, self.label),
                price: 100.0,
                change: 2.0,
                change_percent: 2.0408163265306123,
                high: 101.0,
                low: 97.5,
                open: 98.5,
                previous_close: 98.0,
                volume: 1_000,
                currency: "USD".to_string(),
                exchange: "FAKE".to_string(),
                fifty_two_week_high: 125.0,
                fifty_two_week_low: 75.0,
                fifty_two_week_estimated: true,
            }
        }
    }

    #[async_trait]
    impl MarketProvider for FakeProvider {
        fn name(&self) -> &'static str {
            self.label
        }

        async fn get_quote(&self, symbol: &str) -> MarketResult<StockQuote> {
            self.guard()?;
            Ok(self.quote(symbol))
        }

        async fn get_profile(&self, symbol: &str) -> MarketResult<CompanyProfile> {
            self.guard()?;
            Ok(CompanyProfile {
                symbol: symbol.to_string(),
                name: self.label.to_string(),
                country: String::new(),
                currency: "USD".to_string(),
                exchange: "FAKE".to_string(),
                industry: String::new(),
                market_capitalization: 0.0,
                logo: String::new(),
                weburl: String::new(),
            })
        }

        async fn get_candles(
            &self,
            _symbol: &str,
            _resolution: &str,
            from: i64,
            _to: i64,
        ) -> MarketResult<CandleSeries> {
            self.guard()?;
            let mut series = CandleSeries::default();
            series.push(from, 1.0, 2.0, 0.5, 1.5, 10);
            Ok(series)
        }

        async fn search_symbols(&self, query: &str) -> MarketResult<Vec<SymbolMatch>> {
            self.guard()?;
            Ok(vec![SymbolMatch {
                symbol: format!("{}-{}", query.to_uppercase(), self.label),
                description: self.label.to_string(),
                name: self.label.to_string(),
                instrument_type: "Common Stock".to_string(),
                exchange: "FAKE".to_string(),
            }])
        }

        async fn get_indices(&self) -> MarketResult<Vec<IndexSnapshot>> {
            self.guard()?;
            Ok(vec![IndexSnapshot {
                name: self.label.to_string(),
                value: 1000.0,
                change: 10.0,
                change_percent: 1.0,
            }])
        }

        async fn get_gainers(&self) -> MarketResult<Vec<MarketMover>> {
            self.guard()?;
            Ok(vec![MarketMover {
                symbol: "UP.NS".to_string(),
                name: self.label.to_string(),
                ltp: 10.0,
                net_price: 1.0,
                per_change: 11.1,
            }])
        }

        async fn get_losers(&self) -> MarketResult<Vec<MarketMover>> {
            self.guard()?;
            Ok(vec![MarketMover {
                symbol: "DOWN.NS".to_string(),
                name: self.label.to_string(),
                ltp: 10.0,
                net_price: -1.0,
                per_change: -9.1,
            }])
        }

        async fn get_news(&self, _symbol: &str) -> MarketResult<Vec<NewsItem>> {
            self.guard()?;
            Ok(Vec::new())
        }
    }

    fn service_with(
        india: Vec<Arc<dyn MarketProvider>>,
        global: Vec<Arc<dyn MarketProvider>>,
        all: Vec<Arc<dyn MarketProvider>>,
        movers: Arc<dyn MarketProvider>,
    ) -> HybridMarketService {
        HybridMarketService::from_parts(india, global, all, movers, Arc::new(SimulatedMarket::new()))
    }

    /// 多源合并：部分失败不影响整体，结果按声明顺序拼接
    #[tokio::test]
    async fn test_search_all_settled() {
        println!("\n========== 测试多源合并 ==========");
        let service = service_with(
            vec![],
            vec![],
            vec![
                FakeProvider::ok("alpha"),
                FakeProvider::failing("beta"),
                FakeProvider::ok("gamma"),
            ],
            FakeProvider::ok("movers"),
        );

        let results = service.search_symbols("tcs").await;
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        println!("  合并结果: {:?}", names);
        assert_eq!(names, vec!["alpha", "gamma"]);
        println!("✅ 多源合并测试通过！");
    }

    /// 多源合并：N-1 个失败时调用仍成功
    #[tokio::test]
    async fn test_search_survives_mass_failure() {
        let service = service_with(
            vec![],
            vec![],
            vec![
                FakeProvider::failing("a"),
                FakeProvider::failing("b"),
                FakeProvider::ok("c"),
            ],
            FakeProvider::ok("movers"),
        );

        let results = service.search_symbols("x").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "c");

        // 全部失败时返回空列表而不是错误
        let service = service_with(
            vec![],
            vec![],
            vec![FakeProvider::failing("a"), FakeProvider::failing("b")],
            FakeProvider::ok("movers"),
        );
        assert!(service.search_symbols("x").await.is_empty());
    }

    /// 指数合并与搜索同语义
    #[tokio::test]
    async fn test_indices_all_settled() {
        let service = service_with(
            vec![],
            vec![],
            vec![
                FakeProvider::failing("a"),
                FakeProvider::ok("b"),
                FakeProvider::ok("c"),
            ],
            FakeProvider::ok("movers"),
        );

        let indices = service.get_indices().await;
        let names: Vec<&str> = indices.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    /// 单源路由：按市场分类选链
    #[tokio::test]
    async fn test_market_routing() {
        println!("\n========== 测试市场路由 ==========");
        let service = service_with(
            vec![FakeProvider::ok("india")],
            vec![FakeProvider::ok("global")],
            vec![],
            FakeProvider::ok("movers"),
        );

        let quote = service.get_quote("RELIANCE.NS").await.unwrap();
        assert!(quote.name.contains("india"));

        let quote = service.get_quote("AAPL").await.unwrap();
        assert!(quote.name.contains("global"));
        println!("✅ 市场路由测试通过！");
    }

    /// 调用链全败后落到模拟数据源
    #[tokio::test]
    async fn test_fallback_to_simulated() {
        let service = service_with(
            vec![FakeProvider::failing("a"), FakeProvider::failing("b")],
            vec![],
            vec![],
            FakeProvider::ok("movers"),
        );

        let quote = service.get_quote("RELIANCE.NS").await.unwrap();
        assert_eq!(quote.symbol, "RELIANCE.NS");
        assert_eq!(quote.exchange, "NSE");

        // K线同样由模拟数据源合成
        let candles = service
            .get_candles("RELIANCE.NS", "D", 1_700_000_000, 1_700_000_000 + 10 * 86_400)
            .await
            .unwrap();
        assert_eq!(candles.s, CandleStatus::Ok);
        assert!(!candles.is_empty());
    }

    /// 指定榜单数据源失败时兜底，且兜底结果保持排序约束
    #[tokio::test]
    async fn test_movers_fallback() {
        let service = service_with(
            vec![],
            vec![],
            vec![],
            FakeProvider::failing("movers"),
        );

        let gainers = service.get_gainers().await;
        for pair in gainers.windows(2) {
            assert!(pair[0].per_change >= pair[1].per_change);
        }
        for g in &gainers {
            assert!(g.per_change > 0.0);
        }

        let losers = service.get_losers().await;
        for pair in losers.windows(2) {
            assert!(pair[0].per_change <= pair[1].per_change);
        }
    }
}
