//! 价格相关接口
//!
//! /prices/live 直接返回价格数据，不使用统一响应包装

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::models::ApiResponse;
use crate::services::market::market_status;

pub async fn live_prices(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let response = state.prices.live_prices(state.now()).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn static_prices(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let prices = state
        .prices
        .statics()
        .current()
        .map_err(|e| AppError::NotFound(format!("暂无收盘价数据: {}", e)))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(prices)))
}

pub async fn history_dates(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let dates: Vec<String> = state
        .prices
        .statics()
        .history_dates()?
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(dates)))
}

pub async fn history_for_date(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let raw = path.into_inner();
    let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("日期格式无效: {}，应为 YYYY-MM-DD", raw)))?;

    match state.prices.statics().history(date)? {
        Some(prices) => Ok(HttpResponse::Ok().json(ApiResponse::success(prices))),
        None => Err(AppError::NotFound(format!("{} 没有收盘价记录", raw))),
    }
}

pub async fn get_market_status(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(market_status(state.now()))))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/prices")
            .route("/live", web::get().to(live_prices))
            .route("/static", web::get().to(static_prices))
            .route("/history", web::get().to(history_dates))
            .route("/history/{date}", web::get().to(history_for_date)),
    )
    .route("/market/status", web::get().to(get_market_status));
}
