//! 行情看板后端服务
//!
//! 提供股票报价、K线、新闻、自选股和持仓的 RESTful API 服务
//! 数据来源：Alpha Vantage、Finnhub、NSE、Yahoo Finance、Twelve Data，
//! 上游不可用时由模拟数据源兜底

mod config;   // 配置加载
mod errors;   // 错误类型
mod handlers; // HTTP 请求处理器
mod models;   // 数据模型定义
mod services; // 业务逻辑服务
mod storage;  // 内存存储

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use std::sync::Arc;

use crate::config::{AppConfig, ProviderKeys};
use crate::services::market_service::HybridMarketService;
use crate::services::providers::SimulatedMarket;
use crate::services::sentiment::SentimentAnalyzer;
use crate::storage::MemStorage;

/// 应用程序入口
///
/// 在进程启动时构建全部共享服务实例，经 web::Data 注入各处理器
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let app_config = AppConfig::load();

    // 初始化日志系统，级别来自配置
    env_logger::init_from_env(Env::default().default_filter_or(app_config.log.level.as_str()));

    // 各数据源 API Key 来自环境变量，缺失不阻止启动
    let provider_keys = ProviderKeys::from_env();

    // 模拟行情表 + 唯一的周期刷新写入任务
    let simulated = Arc::new(SimulatedMarket::new());
    let _refresh_task = Arc::clone(&simulated).spawn_refresh();

    let market = web::Data::new(HybridMarketService::new(
        &app_config.upstream,
        &provider_keys,
        Arc::clone(&simulated),
    ));
    let storage = web::Data::new(MemStorage::new());
    let analyzer = web::Data::new(SentimentAnalyzer::new());
    let config_data = web::Data::new(app_config.clone());

    let bind_addr = app_config.bind_addr();
    let workers = app_config.server.workers;
    log::info!("启动行情看板后端服务，监听 {}", bind_addr);

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default()) // 添加请求日志中间件
            .app_data(market.clone())
            .app_data(storage.clone())
            .app_data(analyzer.clone())
            .app_data(config_data.clone())
            .configure(handlers::config) // 配置路由
    })
    .bind(bind_addr)?;

    if workers > 0 {
        server = server.workers(workers);
    }

    server.run().await
}
