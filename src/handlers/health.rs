use actix_web::{web, HttpResponse, Result};
use serde::Serialize;

use crate::handlers::AppState;
use crate::models::ApiResponse;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthInfo {
    status: &'static str,
    players: usize,
    tickers: usize,
}

pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let info = HealthInfo {
        status: "ok",
        players: state.contest.players().len(),
        tickers: state.contest.all_tickers().len(),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(info, "Service is healthy")))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
