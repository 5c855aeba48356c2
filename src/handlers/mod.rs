pub mod health;
pub mod market;
pub mod portfolio;
pub mod watchlist;

use actix_web::{web, HttpResponse};

use crate::errors::MarketError;
use crate::models::ErrorBody;

/// 把服务错误翻译为 HTTP 响应：参数错误 400，其余 500
pub fn error_response(e: &MarketError) -> HttpResponse {
    match e {
        MarketError::Validation(_) => HttpResponse::BadRequest().json(ErrorBody::new(e.to_string())),
        _ => HttpResponse::InternalServerError().json(ErrorBody::new(e.to_string())),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::config).service(
        web::scope("/api")
            .configure(market::config)
            .configure(watchlist::config)
            .configure(portfolio::config),
    );
}
