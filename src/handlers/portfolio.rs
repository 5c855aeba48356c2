//! 持仓接口处理器
//!
//! ## API 列表
//!
//! - GET /api/portfolio - 获取持仓列表
//! - POST /api/portfolio - 添加持仓
//! - PUT /api/portfolio/{symbol} - 原地更新数量与成本价
//! - DELETE /api/portfolio/{symbol} - 按代码移除持仓

use actix_web::{web, HttpResponse, Result};

use crate::config::AppConfig;
use crate::models::{AckBody, NewPortfolioItem, UpdatePortfolioItem};
use crate::storage::MemStorage;

/// 获取持仓列表
///
/// GET /api/portfolio
pub async fn get_portfolio(
    storage: web::Data<MemStorage>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse> {
    let portfolio = storage.get_user_portfolio(config.default_user_id);
    Ok(HttpResponse::Ok().json(portfolio))
}

/// 添加持仓
///
/// POST /api/portfolio
///
/// # 请求体
/// { "symbol": "RELIANCE.NS", "quantity": 10, "avgPrice": 2750.5, "market": "NSE" }
pub async fn add_to_portfolio(
    body: web::Json<NewPortfolioItem>,
    storage: web::Data<MemStorage>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse> {
    let item = storage.add_to_portfolio(config.default_user_id, body.into_inner());
    Ok(HttpResponse::Ok().json(item))
}

/// 原地更新持仓数量与成本价
///
/// PUT /api/portfolio/{symbol}
pub async fn update_portfolio(
    path: web::Path<String>,
    body: web::Json<UpdatePortfolioItem>,
    storage: web::Data<MemStorage>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse> {
    let symbol = path.into_inner();
    let update = body.into_inner();
    storage.update_portfolio(
        config.default_user_id,
        &symbol,
        update.quantity,
        update.avg_price,
    );
    Ok(HttpResponse::Ok().json(AckBody::ok()))
}

/// 按代码移除持仓
///
/// DELETE /api/portfolio/{symbol}
pub async fn remove_from_portfolio(
    path: web::Path<String>,
    storage: web::Data<MemStorage>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse> {
    let symbol = path.into_inner();
    storage.remove_from_portfolio(config.default_user_id, &symbol);
    Ok(HttpResponse::Ok().json(AckBody::ok()))
}

/// 配置持仓相关路由
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/portfolio", web::get().to(get_portfolio))
        .route("/portfolio", web::post().to(add_to_portfolio))
        .route("/portfolio/{symbol}", web::put().to(update_portfolio))
        .route("/portfolio/{symbol}", web::delete().to(remove_from_portfolio));
}

// ==================== 测试模块 ====================
