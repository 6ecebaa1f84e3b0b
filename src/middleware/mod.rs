//! HTTP 中间件

mod cron_auth;

pub use cron_auth::CronAuth;
