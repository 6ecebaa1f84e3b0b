//! 定时任务接口
//!
//! 由外部调度器按分钟调用 update-prices，收盘后调用 daily-close

use actix_web::{web, HttpResponse};

use crate::error::AppResult;
use crate::handlers::AppState;
use crate::middleware::CronAuth;
use crate::models::ApiResponse;

/// 定时任务认证设置
#[derive(Debug, Clone, Default)]
pub struct CronSettings {
    pub secret: Option<String>,
    /// 生产环境严格校验
    pub enforce: bool,
}

pub async fn update_prices(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let report = state.prices.refresh(state.now()).await?;
    let message = report.message.clone();
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(report, message)))
}

pub async fn daily_close(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let report = state.prices.record_daily_close(state.now()).await?;
    let message = report.message.clone();
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(report, message)))
}

pub fn config(cfg: &mut web::ServiceConfig, settings: &CronSettings) {
    cfg.service(
        web::scope("/cron")
            .wrap(CronAuth::new(settings.secret.clone(), settings.enforce))
            .route("/update-prices", web::get().to(update_prices))
            .route("/update-prices", web::post().to(update_prices))
            .route("/daily-close", web::get().to(daily_close))
            .route("/daily-close", web::post().to(daily_close)),
    );
}
