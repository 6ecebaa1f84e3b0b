//! HTTP 请求处理器
//!
//! 所有接口挂在 /api/v1 下，共享状态通过 web::Data<AppState> 注入

pub mod cron;
pub mod health;
pub mod prices;
pub mod standings;

use actix_web::web;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::services::contest::Contest;
use crate::services::price_service::PriceService;

pub use cron::CronSettings;

/// 应用共享状态
pub struct AppState {
    pub contest: Arc<Contest>,
    pub prices: Arc<PriceService>,
    /// 当前时间，测试中可替换为固定时间
    pub clock: fn() -> DateTime<Utc>,
}

impl AppState {
    pub fn new(contest: Arc<Contest>, prices: Arc<PriceService>) -> Self {
        Self {
            contest,
            prices,
            clock: Utc::now,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

pub fn config(cfg: &mut web::ServiceConfig, cron_settings: &CronSettings) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::config)
            .configure(prices::config)
            .configure(standings::config)
            .configure(|c| cron::config(c, cron_settings)),
    );
}
