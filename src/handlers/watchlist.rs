//! 自选股接口处理器
//!
//! ## API 列表
//!
//! - GET /api/watchlist - 获取自选股列表
//! - POST /api/watchlist - 添加自选股
//! - DELETE /api/watchlist/{symbol} - 按代码移除自选股

use actix_web::{web, HttpResponse, Result};

use crate::config::AppConfig;
use crate::models::{AckBody, NewWatchlistItem};
use crate::storage::MemStorage;

/// 获取自选股列表
///
/// GET /api/watchlist
pub async fn get_watchlist(
    storage: web::Data<MemStorage>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse> {
    let watchlist = storage.get_user_watchlist(config.default_user_id);
    Ok(HttpResponse::Ok().json(watchlist))
}

/// 添加自选股
///
/// POST /api/watchlist
///
/// # 请求体
/// { "symbol": "TCS.NS", "market": "NSE" }
pub async fn add_to_watchlist(
    body: web::Json<NewWatchlistItem>,
    storage: web::Data<MemStorage>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse> {
    let item = storage.add_to_watchlist(config.default_user_id, body.into_inner());
    Ok(HttpResponse::Ok().json(item))
}

/// 按代码移除自选股
///
/// DELETE /api/watchlist/{symbol}
pub async fn remove_from_watchlist(
    path: web::Path<String>,
    storage: web::Data<MemStorage>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse> {
    let symbol = path.into_inner();
    storage.remove_from_watchlist(config.default_user_id, &symbol);
    Ok(HttpResponse::Ok().json(AckBody::ok()))
}

/// 配置自选股相关路由
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/watchlist", web::get().to(get_watchlist))
        .route("/watchlist", web::post().to(add_to_watchlist))
        .route("/watchlist/{symbol}", web::delete().to(remove_from_watchlist));
}

// ==================== 测试模块 ====================

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    use crate::models::WatchlistItem;

    fn test_app_data() -> (web::Data<MemStorage>, web::Data<AppConfig>) {
        (
            web::Data::new(MemStorage::new()),
            web::Data::new(AppConfig::default()),
        )
    }

    /// 自选股 HTTP 闭环：添加 -> 查询 -> 删除 -> 查询
    #[actix_web::test]
    async fn test_watchlist_http_round_trip() {
        println!("\n========== 测试自选股 HTTP 闭环 ==========");
        let (storage, config_data) = test_app_data();
        let app = test::init_service(
            App::new()
                .app_data(storage)
                .app_data(config_data)
                .configure(config),
        )
        .await;

        // 添加
        let req = test::TestRequest::post()
            .uri("/watchlist")
            .set_json(serde_json::json!({ "symbol": "TCS.NS", "market": "NSE" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let added: WatchlistItem = test::read_body_json(resp).await;
        assert_eq!(added.symbol, "TCS.NS");

        // 查询
        let req = test::TestRequest::get().uri("/watchlist").to_request();
        let list: Vec<WatchlistItem> =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].symbol, "TCS.NS");

        // 删除
        let req = test::TestRequest::delete()
            .uri("/watchlist/TCS.NS")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        // 再查询为空
        let req = test::TestRequest::get().uri("/watchlist").to_request();
        let list: Vec<WatchlistItem> =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert!(list.is_empty());
        println!("✅ 自选股 HTTP 闭环测试通过！");
    }
}
