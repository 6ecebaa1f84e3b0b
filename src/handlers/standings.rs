//! 排名与统计接口
//!
//! 每次请求都重新计算排名：静态收盘价叠加缓存中的实时价格，
//! 上一名次取自今天之前最近一次的收盘记录

use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::models::{ApiResponse, PlayersData, Standing};
use crate::services::market::eastern_date;
use crate::services::standings::{
    calculate_standings, compare, contest_stats, effective_prices, rank_map, stock_board,
};

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    pub player1: String,
    pub player2: String,
}

/// 按当前价格计算排名
async fn current_standings(state: &AppState, now: DateTime<Utc>) -> AppResult<Vec<Standing>> {
    let statics = state.prices.statics();
    let players = state.contest.players();

    // 只读缓存，缓存未命中时按收盘价计算，不在请求中拉取报价
    let live = state.prices.cached_prices(now).await.price_map();
    let prices = effective_prices(&statics.current_or_empty().prices, &live);

    let previous = statics
        .latest_before(eastern_date(now))?
        .map(|(_, close)| rank_map(&calculate_standings(players, &close.prices, None)));

    Ok(calculate_standings(players, &prices, previous.as_ref()))
}

pub async fn get_standings(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let standings = current_standings(&state, state.now()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(standings)))
}

pub async fn get_player_standing(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let player_id = path.into_inner();
    let standing = current_standings(&state, state.now())
        .await?
        .into_iter()
        .find(|s| s.player.id == player_id)
        .ok_or_else(|| AppError::NotFound(format!("选手不存在: {}", player_id)))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(standing)))
}

pub async fn compare_players(
    state: web::Data<AppState>,
    query: web::Query<CompareQuery>,
) -> AppResult<HttpResponse> {
    if query.player1 == query.player2 {
        return Err(AppError::BadRequest("请选择两名不同的选手".to_string()));
    }

    let standings = current_standings(&state, state.now()).await?;
    let comparison = compare(&standings, &query.player1, &query.player2).ok_or_else(|| {
        AppError::NotFound(format!("选手不存在: {} / {}", query.player1, query.player2))
    })?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(comparison)))
}

pub async fn get_stock_board(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let standings = current_standings(&state, state.now()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(stock_board(&standings))))
}

pub async fn get_stats(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let now = state.now();
    let standings = current_standings(&state, now).await?;

    let end_date = &state.contest.info().end_date;
    let end = NaiveDate::parse_from_str(end_date, "%Y-%m-%d").ok();
    if end.is_none() {
        log::warn!("比赛结束日期无法解析: {}", end_date);
    }

    let stats = contest_stats(&standings, eastern_date(now), end);
    Ok(HttpResponse::Ok().json(ApiResponse::success(stats)))
}

pub async fn get_contest(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let data = PlayersData {
        contest_info: state.contest.info().clone(),
        players: state.contest.players().to_vec(),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/standings", web::get().to(get_standings))
        .route("/standings/{player_id}", web::get().to(get_player_standing))
        .route("/compare", web::get().to(compare_players))
        .route("/stocks", web::get().to(get_stock_board))
        .route("/stats", web::get().to(get_stats))
        .route("/contest", web::get().to(get_contest));
}
