use actix_web::{web, HttpResponse, Result};

use crate::models::AckBody;

pub async fn health_check() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(AckBody::ok()))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
