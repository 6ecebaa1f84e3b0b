//! 选股比赛后端服务
//!
//! 提供实时股价、收盘价历史和选手排名的 RESTful API 服务
//! 数据来源：Finnhub 报价接口，Redis 或进程内存共享缓存

mod config;     // 配置
mod error;      // HTTP 错误类型
mod handlers;   // HTTP 请求处理器
mod middleware; // 中间件
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::handlers::{AppState, CronSettings};
use crate::services::cache::{MemoryStore, RedisStore, SharedPriceStore};
use crate::services::contest::Contest;
use crate::services::price_service::{PriceService, PriceServiceOptions};
use crate::services::quotes::{FinnhubClient, QuoteProvider};
use crate::services::static_store::StaticPriceStore;

/// 创建共享缓存，Redis 不可用时退回进程内存
async fn shared_store(config: &AppConfig) -> Arc<dyn SharedPriceStore> {
    let Some(url) = &config.cache.redis_url else {
        log::info!("未设置 REDIS_URL，使用进程内共享缓存");
        return Arc::new(MemoryStore::new());
    };

    match RedisStore::connect(url, config.cache.shared_ttl()).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            log::warn!("{:#}，使用进程内共享缓存", e);
            Arc::new(MemoryStore::new())
        }
    }
}

/// 创建报价源，未设置 API Key 时只能提供收盘价
fn quote_provider(config: &AppConfig) -> anyhow::Result<Option<Arc<dyn QuoteProvider>>> {
    let Some(api_key) = config.quote.api_key.clone() else {
        log::warn!("未设置 FINNHUB_API_KEY，开盘时间内实时价格不可用");
        return Ok(None);
    };

    let client = FinnhubClient::new(
        &config.quote.base_url,
        api_key,
        config.quote.timeout(),
        config.quote.connect_timeout(),
    )?;
    Ok(Some(Arc::new(client)))
}

/// 应用程序入口
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let (config, source) = AppConfig::load()?;

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.clone()));

    match source {
        Some(path) => log::info!("从 {} 加载配置", path),
        None => log::info!("未找到配置文件，使用默认配置"),
    }
    log::info!("运行环境: {}", config.server.environment);

    let contest = Contest::from_file(config.players_path(), config.data.stocks_per_player)
        .with_context(|| format!("加载比赛数据 {} 失败", config.players_path().display()))?;
    log::info!(
        "已加载比赛 {}: {} 名选手，{} 只股票",
        contest.info().name,
        contest.players().len(),
        contest.all_tickers().len()
    );

    if config.is_production() && config.cron.secret.is_none() {
        log::warn!("生产环境未设置 CRON_SECRET，定时任务接口将返回 500");
    }

    let prices = PriceService::new(
        quote_provider(&config)?,
        shared_store(&config).await,
        StaticPriceStore::new(&config.data.dir),
        contest.all_tickers(),
        PriceServiceOptions::from_config(&config),
    );

    let state = web::Data::new(AppState::new(Arc::new(contest), Arc::new(prices)));
    let cron_settings = CronSettings {
        secret: config.cron.secret.clone(),
        enforce: config.is_production(),
    };

    let bind_addr = config.bind_addr();
    log::info!("启动选股比赛后端服务: {}", bind_addr);

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())  // 添加请求日志中间件
            .app_data(state.clone())
            .configure(|cfg| handlers::config(cfg, &cron_settings))  // 配置路由
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(&bind_addr)?.run().await?;
    Ok(())
}
