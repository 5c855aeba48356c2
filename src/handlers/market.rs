//! 行情接口处理器
//!
//! 提供行情数据的 HTTP API 端点
//!
//! ## API 列表
//!
//! - GET /api/quote/{symbol} - 获取实时报价
//! - GET /api/profile/{symbol} - 获取公司概况
//! - GET /api/news/{symbol} - 获取个股新闻（含情绪标签）
//! - GET /api/candles/{symbol} - 获取K线序列
//! - GET /api/indices - 获取指数快照
//! - GET /api/gainers - 获取涨幅榜
//! - GET /api/losers - 获取跌幅榜
//! - GET /api/search/{query} - 搜索股票代码

use actix_web::{web, HttpResponse, Result};

use crate::errors::MarketError;
use crate::handlers::error_response;
use crate::models::CandleQuery;
use crate::services::market_service::HybridMarketService;
use crate::services::sentiment::SentimentAnalyzer;

/// 搜索结果条数上限
const SEARCH_LIMIT: usize = 10;

/// 获取单只股票实时报价
///
/// GET /api/quote/{symbol}
pub async fn get_quote(
    path: web::Path<String>,
    market: web::Data<HybridMarketService>,
) -> Result<HttpResponse> {
    let symbol = path.into_inner();

    match market.get_quote(&symbol).await {
        Ok(quote) => Ok(HttpResponse::Ok().json(quote)),
        Err(e) => {
            log::error!("获取 {} 报价失败: {}", symbol, e);
            Ok(error_response(&e))
        }
    }
}

/// 获取公司概况
///
/// GET /api/profile/{symbol}
pub async fn get_profile(
    path: web::Path<String>,
    market: web::Data<HybridMarketService>,
) -> Result<HttpResponse> {
    let symbol = path.into_inner();

    match market.get_profile(&symbol).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(profile)),
        Err(e) => {
            log::error!("获取 {} 概况失败: {}", symbol, e);
            Ok(error_response(&e))
        }
    }
}

/// 获取个股新闻；数据源未带情绪标签的条目由服务端补打
///
/// GET /api/news/{symbol}
pub async fn get_news(
    path: web::Path<String>,
    market: web::Data<HybridMarketService>,
    analyzer: web::Data<SentimentAnalyzer>,
) -> Result<HttpResponse> {
    let symbol = path.into_inner();
    let mut news = market.get_news(&symbol).await;

    for article in &mut news {
        if article.sentiment.is_none() {
            let text = format!("{} {}", article.headline, article.summary);
            article.sentiment = Some(analyzer.analyze(&text));
        }
    }

    Ok(HttpResponse::Ok().json(news))
}

/// 获取K线序列
///
/// GET /api/candles/{symbol}?resolution=D&from=1700000000&to=1702592000
///
/// # 参数
/// - resolution: 周期代码 5 / 15 / 30 / 60 / D（可选，默认 D）
/// - from / to: 时间戳（秒），闭区间
pub async fn get_candles(
    path: web::Path<String>,
    query: web::Query<CandleQuery>,
    market: web::Data<HybridMarketService>,
) -> Result<HttpResponse> {
    let symbol = path.into_inner();
    let resolution = query.resolution.as_deref().unwrap_or("D");

    if query.from > query.to {
        let e = MarketError::Validation(format!(
            "时间区间不合法: from={} > to={}",
            query.from, query.to
        ));
        return Ok(error_response(&e));
    }

    match market
        .get_candles(&symbol, resolution, query.from, query.to)
        .await
    {
        Ok(candles) => Ok(HttpResponse::Ok().json(candles)),
        Err(e) => {
            log::error!("获取 {} K线失败: {}", symbol, e);
            Ok(error_response(&e))
        }
    }
}

/// 获取指数快照（多源合并）
///
/// GET /api/indices
pub async fn get_indices(market: web::Data<HybridMarketService>) -> Result<HttpResponse> {
    let indices = market.get_indices().await;
    Ok(HttpResponse::Ok().json(indices))
}

/// 获取涨幅榜
///
/// GET /api/gainers
pub async fn get_gainers(market: web::Data<HybridMarketService>) -> Result<HttpResponse> {
    let gainers = market.get_gainers().await;
    Ok(HttpResponse::Ok().json(gainers))
}

/// 获取跌幅榜
///
/// GET /api/losers
pub async fn get_losers(market: web::Data<HybridMarketService>) -> Result<HttpResponse> {
    let losers = market.get_losers().await;
    Ok(HttpResponse::Ok().json(losers))
}

/// 搜索股票代码（多源合并，最多返回10条）
///
/// GET /api/search/{query}
pub async fn search_symbols(
    path: web::Path<String>,
    market: web::Data<HybridMarketService>,
) -> Result<HttpResponse> {
    let query = path.into_inner();
    let mut results = market.search_symbols(&query).await;
    results.truncate(SEARCH_LIMIT);
    Ok(HttpResponse::Ok().json(results))
}

/// 配置行情相关路由
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/quote/{symbol}", web::get().to(get_quote))
        .route("/profile/{symbol}", web::get().to(get_profile))
        .route("/news/{symbol}", web::get().to(get_news))
        .route("/candles/{symbol}", web::get().to(get_candles))
        .route("/indices", web::get().to(get_indices))
        .route("/gainers", web::get().to(get_gainers))
        .route("/losers", web::get().to(get_losers))
        .route("/search/{query}", web::get().to(search_symbols));
}

// ==================== 测试模块 ====================

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use std::sync::Arc;

    use crate::models::{CandleSeries, ErrorBody, MarketMover, StockQuote};
    use crate::services::providers::{MarketProvider, SimulatedMarket};

    /// 只挂模拟数据源的测试服务
    fn test_market() -> web::Data<HybridMarketService> {
        let simulated = Arc::new(SimulatedMarket::new());
        web::Data::new(HybridMarketService::from_parts(
            vec![],
            vec![],
            vec![Arc::clone(&simulated) as Arc<dyn MarketProvider>],
            Arc::clone(&simulated) as Arc<dyn MarketProvider>,
            simulated,
        ))
    }

    /// 涨幅榜端到端：严格降序、不超过10条、全部为正
    #[actix_web::test]
    async fn test_gainers_endpoint() {
        println!("\n========== 测试涨幅榜端点 ==========");
        let app = test::init_service(
            App::new()
                .app_data(test_market())
                .app_data(web::Data::new(SentimentAnalyzer::new()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/gainers").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let gainers: Vec<MarketMover> = test::read_body_json(resp).await;
        println!("  涨幅榜条数: {}", gainers.len());
        assert!(gainers.len() <= 10);
        for pair in gainers.windows(2) {
            assert!(pair[0].per_change >= pair[1].per_change);
        }
        for g in &gainers {
            assert!(g.per_change > 0.0);
        }
        println!("✅ 涨幅榜端点测试通过！");
    }

    /// 报价端到端：兜底数据源兜住未配置上游的请求
    #[actix_web::test]
    async fn test_quote_endpoint() {
        let app = test::init_service(
            App::new()
                .app_data(test_market())
                .app_data(web::Data::new(SentimentAnalyzer::new()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/quote/TCS.NS").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let quote: StockQuote = test::read_body_json(resp).await;
        assert_eq!(quote.symbol, "TCS.NS");
        assert!(quote.low <= quote.price && quote.price <= quote.high);
    }

    /// 未知代码返回 500 + 错误体
    #[actix_web::test]
    async fn test_quote_unknown_symbol() {
        let app = test::init_service(
            App::new()
                .app_data(test_market())
                .app_data(web::Data::new(SentimentAnalyzer::new()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/quote/NOPE.NS").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 500);

        let body: ErrorBody = test::read_body_json(resp).await;
        assert!(!body.error.is_empty());
    }

    /// K线端到端：数组平行且时间升序
    #[actix_web::test]
    async fn test_candles_endpoint() {
        let app = test::init_service(
            App::new()
                .app_data(test_market())
                .app_data(web::Data::new(SentimentAnalyzer::new()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/candles/INFY.NS?resolution=D&from=1700000000&to=1702592000")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let candles: CandleSeries = test::read_body_json(resp).await;
        let n = candles.len();
        assert!(n > 0);
        assert_eq!(candles.o.len(), n);
        assert_eq!(candles.v.len(), n);
        for pair in candles.t.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    /// 时间区间倒置返回 400
    #[actix_web::test]
    async fn test_candles_invalid_range() {
        let app = test::init_service(
            App::new()
                .app_data(test_market())
                .app_data(web::Data::new(SentimentAnalyzer::new()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/candles/INFY.NS?from=1702592000&to=1700000000")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
    }

    /// 搜索端到端：结果不超过10条
    #[actix_web::test]
    async fn test_search_endpoint() {
        let app = test::init_service(
            App::new()
                .app_data(test_market())
                .app_data(web::Data::new(SentimentAnalyzer::new()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/search/a").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let results: Vec<serde_json::Value> = test::read_body_json(resp).await;
        assert!(results.len() <= 10);
    }

    /// 指数端到端：模拟数据源保证非空
    #[actix_web::test]
    async fn test_indices_endpoint() {
        let app = test::init_service(
            App::new()
                .app_data(test_market())
                .app_data(web::Data::new(SentimentAnalyzer::new()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/indices").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let indices: Vec<serde_json::Value> = test::read_body_json(resp).await;
        assert!(!indices.is_empty());
    }
}
