//! 价格服务
//!
//! 串联报价获取、两层缓存和静态收盘价：
//! - live_prices：读路径，按 共享缓存 → 本地缓存 → 直接拉取 → 过期本地缓存 → 静态收盘价 回退
//! - refresh：定时任务，开盘时拉取报价并合并进缓存
//! - record_daily_close：收盘后记录当日收盘价

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    CachedPrice, DailyCloseReport, LivePrice, LivePricesResponse, MarketStatus, PriceSnapshot,
    PriceSource, Quote, RefreshReport, StaticPrices,
};
use crate::services::cache::{CacheLookup, PriceCache, SharedPriceStore};
use crate::services::market::{eastern_date, is_after_close, is_trading_day, market_status};
use crate::services::quotes::{batch_for_group, fetch_quotes, FetchStrategy, QuoteProvider};
use crate::services::static_store::StaticPriceStore;

/// 价格服务参数
#[derive(Debug, Clone)]
pub struct PriceServiceOptions {
    pub strategy: FetchStrategy,
    pub request_delay: Duration,
    pub local_ttl: Duration,
    pub shared_ttl: Duration,
    pub direct_fetch_on_miss: bool,
}

impl PriceServiceOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            strategy: config.quote.strategy,
            request_delay: config.quote.request_delay(),
            local_ttl: config.cache.local_ttl(),
            shared_ttl: config.cache.shared_ttl(),
            direct_fetch_on_miss: config.quote.direct_fetch_on_miss,
        }
    }
}

pub struct PriceService {
    /// 报价源，未配置 API Key 时为空
    provider: Option<Arc<dyn QuoteProvider>>,
    shared: Arc<dyn SharedPriceStore>,
    local: PriceCache,
    statics: StaticPriceStore,
    /// 全部股票代码
    tickers: Vec<String>,
    options: PriceServiceOptions,
}

fn to_cached(quotes: &BTreeMap<String, Quote>, now_ms: i64) -> BTreeMap<String, CachedPrice> {
    quotes
        .iter()
        .map(|(ticker, quote)| (ticker.clone(), CachedPrice::from_quote(quote, now_ms)))
        .collect()
}

/// RFC 3339 时间转毫秒时间戳
fn parse_timestamp_ms(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.timestamp_millis())
}

impl PriceService {
    pub fn new(
        provider: Option<Arc<dyn QuoteProvider>>,
        shared: Arc<dyn SharedPriceStore>,
        statics: StaticPriceStore,
        tickers: Vec<String>,
        options: PriceServiceOptions,
    ) -> Self {
        Self {
            provider,
            shared,
            local: PriceCache::new(options.local_ttl),
            statics,
            tickers,
            options,
        }
    }

    pub fn statics(&self) -> &StaticPriceStore {
        &self.statics
    }

    fn provider(&self) -> AppResult<&dyn QuoteProvider> {
        self.provider
            .as_deref()
            .ok_or_else(|| AppError::Config("未配置 FINNHUB_API_KEY".to_string()))
    }

    fn snapshot_response(
        snapshot: PriceSnapshot,
        source: PriceSource,
        cached: bool,
        stale: bool,
    ) -> LivePricesResponse {
        let prices = snapshot
            .prices
            .into_iter()
            .map(|(ticker, p)| {
                let live = LivePrice {
                    price: p.price,
                    change: Some(p.change),
                    change_percent: Some(p.change_percent),
                    updated_at: p.updated_at,
                };
                (ticker, live)
            })
            .collect();

        LivePricesResponse {
            prices,
            timestamp: snapshot.timestamp,
            market_status: snapshot.market_status,
            cached,
            source,
            stale,
            message: None,
        }
    }

    fn static_response(&self, status: MarketStatus, source: PriceSource, now_ms: i64) -> LivePricesResponse {
        let statics = self.statics.current_or_empty();
        let timestamp = parse_timestamp_ms(&statics.last_updated).unwrap_or(now_ms);

        let prices = statics
            .prices
            .into_iter()
            .map(|(ticker, price)| {
                let live = LivePrice {
                    price,
                    change: None,
                    change_percent: None,
                    updated_at: timestamp,
                };
                (ticker, live)
            })
            .collect();

        let (stale, message) = match source {
            PriceSource::Static => (false, "Market closed - using daily close prices"),
            _ => (true, "Live prices unavailable - using daily close prices"),
        };

        LivePricesResponse {
            prices,
            timestamp,
            market_status: status,
            cached: false,
            source,
            stale,
            message: Some(message.to_string()),
        }
    }

    /// 共享缓存中的有效快照，读取失败按未命中处理
    async fn fresh_shared(&self, now_ms: i64) -> Option<PriceSnapshot> {
        match self.shared.load().await {
            Ok(Some(s)) if !s.is_empty() && s.is_fresh(now_ms, self.options.shared_ttl) => Some(s),
            Ok(_) => None,
            Err(e) => {
                log::warn!("读取共享缓存失败，回退: {:#}", e);
                None
            }
        }
    }

    /// 获取实时价格
    ///
    /// 始终返回一份价格数据，降级通过 source/cached/stale 体现；
    /// 只有需要直接拉取但未配置 API Key 时返回错误
    pub async fn live_prices(&self, now: DateTime<Utc>) -> AppResult<LivePricesResponse> {
        self.resolve(now, self.options.direct_fetch_on_miss).await
    }

    /// 只读缓存和收盘价，不发起报价请求
    ///
    /// 排名类接口使用，缓存全部未命中时退回收盘价
    pub async fn cached_prices(&self, now: DateTime<Utc>) -> LivePricesResponse {
        let now_ms = now.timestamp_millis();
        match self.resolve(now, false).await {
            Ok(response) => response,
            // 不直接拉取时不会出错
            Err(_) => self.static_response(market_status(now), PriceSource::StaticFallback, now_ms),
        }
    }

    async fn resolve(&self, now: DateTime<Utc>, direct_fetch: bool) -> AppResult<LivePricesResponse> {
        let now_ms = now.timestamp_millis();
        let status = market_status(now);

        if !status.is_open {
            return Ok(self.static_response(status, PriceSource::Static, now_ms));
        }

        if let Some(snapshot) = self.fresh_shared(now_ms).await {
            return Ok(Self::snapshot_response(snapshot, self.shared.source(), true, false));
        }

        let stale_local = match self.local.lookup(now_ms, true) {
            CacheLookup::Fresh(snapshot) => {
                return Ok(Self::snapshot_response(snapshot, PriceSource::Local, true, false));
            }
            CacheLookup::Stale(snapshot) => Some(snapshot),
            CacheLookup::Empty => None,
        };

        if direct_fetch {
            let provider = self.provider()?;
            log::info!("缓存未命中，直接拉取 {} 只股票报价", self.tickers.len());

            let quotes = fetch_quotes(provider, &self.tickers, self.options.request_delay).await;
            if !quotes.is_empty() {
                let snapshot = self.local.update(&to_cached(&quotes, now_ms), status, now_ms);
                log::info!("直接拉取成功 {} 只", quotes.len());
                return Ok(Self::snapshot_response(snapshot, PriceSource::Direct, false, false));
            }
            log::warn!("直接拉取未获得任何报价");
        }

        match stale_local {
            Some(snapshot) => Ok(Self::snapshot_response(snapshot, PriceSource::LocalStale, true, true)),
            None => Ok(self.static_response(status, PriceSource::StaticFallback, now_ms)),
        }
    }

    /// 定时刷新
    ///
    /// 休市时跳过；alternating 策略下每次只拉取一半股票
    pub async fn refresh(&self, now: DateTime<Utc>) -> AppResult<RefreshReport> {
        let provider = self.provider()?;
        let now_ms = now.timestamp_millis();
        let status = market_status(now);

        if !status.is_open {
            return Ok(RefreshReport {
                fetched: false,
                message: "Market closed - skipping price fetch".to_string(),
                market_status: status,
                group: None,
                requested: 0,
                updated: 0,
                timestamp: now_ms,
            });
        }

        let (group, batch) = match self.options.strategy {
            FetchStrategy::Sequential => (None, self.tickers.as_slice()),
            FetchStrategy::Alternating => {
                let group = self.shared.next_batch_group().await.unwrap_or_else(|e| {
                    log::warn!("读取分组计数器失败，使用第 1 组: {:#}", e);
                    0
                });
                (Some(group), batch_for_group(&self.tickers, group))
            }
        };

        match group {
            Some(g) => log::info!("[Cron] 拉取第 {}/2 组: {} 只股票", g + 1, batch.len()),
            None => log::info!("[Cron] 拉取全部 {} 只股票", batch.len()),
        }

        let quotes = fetch_quotes(provider, batch, self.options.request_delay).await;
        let updates = to_cached(&quotes, now_ms);

        if let Err(e) = self.shared.merge(&updates, status.clone(), now_ms).await {
            log::warn!("写入共享缓存失败: {:#}", e);
        }
        self.local.update(&updates, status.clone(), now_ms);

        log::info!("[Cron] 已更新 {} 只股票价格", updates.len());

        let message = match group {
            Some(g) => format!("Updated group {}/2: {} prices", g + 1, updates.len()),
            None => format!("Updated {} prices", updates.len()),
        };

        Ok(RefreshReport {
            fetched: true,
            message,
            market_status: status,
            group,
            requested: batch.len(),
            updated: updates.len(),
            timestamp: now_ms,
        })
    }

    /// 记录当日收盘价
    ///
    /// 只在交易日收盘后执行；拉取失败的股票沿用 currentPrices.json 中的旧价格；
    /// 一只都没拉到时不写文件；历史文件已存在时不再拉取
    pub async fn record_daily_close(&self, now: DateTime<Utc>) -> AppResult<DailyCloseReport> {
        let provider = self.provider()?;
        let date = eastern_date(now);
        let date_str = date.format("%Y-%m-%d").to_string();

        let skipped = |message: &str| DailyCloseReport {
            date: date_str.clone(),
            history_written: false,
            fetched: 0,
            filled_from_previous: Vec::new(),
            missing: Vec::new(),
            message: message.to_string(),
        };

        if !is_trading_day(now) {
            return Ok(skipped("Not a trading day - skipping daily close"));
        }
        if !is_after_close(now) {
            return Ok(skipped("Market has not closed yet - skipping daily close"));
        }
        if self.statics.history(date)?.is_some() {
            return Ok(skipped("Daily close already recorded"));
        }

        log::info!("记录 {} 收盘价，共 {} 只股票", date_str, self.tickers.len());
        let quotes = fetch_quotes(provider, &self.tickers, self.options.request_delay).await;
        if quotes.is_empty() {
            // 不写入任何文件，留给下一次调用重试
            log::error!("{} 收盘价全部获取失败，本次不记录", date_str);
            return Ok(DailyCloseReport {
                missing: self.tickers.clone(),
                ..skipped("No quotes fetched - daily close not recorded")
            });
        }
        let existing = self.statics.current_or_empty();

        let mut prices: BTreeMap<String, f64> =
            quotes.iter().map(|(t, q)| (t.clone(), q.price)).collect();
        let mut filled = Vec::new();
        let mut missing = Vec::new();

        for ticker in &self.tickers {
            if prices.contains_key(ticker) {
                continue;
            }
            match existing.prices.get(ticker) {
                Some(price) => {
                    log::warn!("{} 使用旧价格: {}", ticker, price);
                    prices.insert(ticker.clone(), *price);
                    filled.push(ticker.clone());
                }
                None => missing.push(ticker.clone()),
            }
        }

        let close = StaticPrices {
            last_updated: now.to_rfc3339(),
            prices,
        };
        self.statics.write_current(&close)?;
        let history_written = self.statics.write_history(date, &close)?;

        log::info!(
            "收盘价已保存: 成功 {}，补齐 {}，缺失 {}",
            quotes.len(),
            filled.len(),
            missing.len()
        );

        Ok(DailyCloseReport {
            date: date_str,
            history_written,
            fetched: quotes.len(),
            filled_from_previous: filled,
            missing,
            message: "Daily close recorded".to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::services::cache::MemoryStore;
    use crate::services::quotes::mock::MockProvider;

    pub fn tickers(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("T{}", i)).collect()
    }

    pub fn options(strategy: FetchStrategy) -> PriceServiceOptions {
        PriceServiceOptions {
            strategy,
            request_delay: Duration::ZERO,
            local_ttl: Duration::from_secs(60),
            shared_ttl: Duration::from_secs(300),
            direct_fetch_on_miss: true,
        }
    }

    pub fn service(
        provider: Option<MockProvider>,
        shared: Arc<MemoryStore>,
        dir: &std::path::Path,
        tickers: Vec<String>,
        strategy: FetchStrategy,
    ) -> PriceService {
        PriceService::new(
            provider.map(|p| Arc::new(p) as Arc<dyn QuoteProvider>),
            shared,
            StaticPriceStore::new(dir),
            tickers,
            options(strategy),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::services::cache::MemoryStore;
    use crate::services::market::et;
    use crate::services::quotes::mock::MockProvider;

    fn all_priced(tickers: &[String], price: f64) -> MockProvider {
        let prices: Vec<(&str, f64)> = tickers.iter().map(|t| (t.as_str(), price)).collect();
        MockProvider::with_prices(&prices)
    }

    fn write_static(dir: &std::path::Path, entries: &[(&str, f64)]) {
        StaticPriceStore::new(dir)
            .write_current(&StaticPrices {
                last_updated: "2026-10-16T20:30:00+00:00".to_string(),
                prices: entries.iter().map(|(t, p)| (t.to_string(), *p)).collect(),
            })
            .unwrap();
    }

    #[tokio::test]
    async fn test_closed_market_uses_static() {
        let dir = tempfile::tempdir().unwrap();
        write_static(dir.path(), &[("T1", 42.0)]);
        let svc = service(None, Arc::new(MemoryStore::new()), dir.path(), tickers(1), FetchStrategy::Sequential);

        let resp = svc.live_prices(et(2026, 10, 18, 12, 0)).await.unwrap();

        assert_eq!(resp.source, PriceSource::Static);
        assert!(!resp.cached);
        assert!(!resp.market_status.is_open);
        assert_eq!(resp.prices["T1"].price, 42.0);
        assert_eq!(resp.timestamp, parse_timestamp_ms("2026-10-16T20:30:00+00:00").unwrap());
    }

    #[tokio::test]
    async fn test_fresh_shared_cache_is_live_tier() {
        let dir = tempfile::tempdir().unwrap();
        let all = tickers(4);
        let shared = Arc::new(MemoryStore::new());
        let svc = service(Some(all_priced(&all, 10.0)), shared.clone(), dir.path(), all.clone(), FetchStrategy::Sequential);

        let open = et(2026, 10, 19, 10, 0);
        svc.refresh(open).await.unwrap();

        let resp = svc.live_prices(open + chrono::Duration::seconds(120)).await.unwrap();
        assert_eq!(resp.source, PriceSource::Cron);
        assert!(resp.cached);
        assert_eq!(resp.prices.len(), 4);
    }

    #[tokio::test]
    async fn test_direct_then_local() {
        let dir = tempfile::tempdir().unwrap();
        let all = tickers(3);
        let svc = service(Some(all_priced(&all, 5.0)), Arc::new(MemoryStore::new()), dir.path(), all.clone(), FetchStrategy::Sequential);
        let open = et(2026, 10, 19, 11, 0);

        let first = svc.live_prices(open).await.unwrap();
        assert_eq!(first.source, PriceSource::Direct);
        assert!(!first.cached);
        assert_eq!(first.prices.len(), 3);

        let second = svc.live_prices(open + chrono::Duration::seconds(30)).await.unwrap();
        assert_eq!(second.source, PriceSource::Local);
        assert!(second.cached);
    }

    #[tokio::test]
    async fn test_outage_falls_back_to_stale_local_then_static() {
        let dir = tempfile::tempdir().unwrap();
        write_static(dir.path(), &[("T1", 1.0)]);
        let all = tickers(1);
        let open = et(2026, 10, 19, 11, 0);

        // 没有任何缓存且拉取失败
        let down = service(Some(MockProvider::default().failing("T1")), Arc::new(MemoryStore::new()), dir.path(), all.clone(), FetchStrategy::Sequential);
        let resp = down.live_prices(open).await.unwrap();
        assert_eq!(resp.source, PriceSource::StaticFallback);
        assert!(resp.stale);
        assert_eq!(resp.prices["T1"].price, 1.0);

        // 本地缓存过期后拉取失败
        let svc = service(Some(all_priced(&all, 2.0)), Arc::new(MemoryStore::new()), dir.path(), all.clone(), FetchStrategy::Sequential);
        svc.live_prices(open).await.unwrap();
        let svc = PriceService {
            provider: Some(Arc::new(MockProvider::default().failing("T1"))),
            ..svc
        };
        let resp = svc.live_prices(open + chrono::Duration::seconds(90)).await.unwrap();
        assert_eq!(resp.source, PriceSource::LocalStale);
        assert!(resp.cached);
        assert!(resp.stale);
        assert_eq!(resp.prices["T1"].price, 2.0);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(None, Arc::new(MemoryStore::new()), dir.path(), tickers(2), FetchStrategy::Sequential);
        let open = et(2026, 10, 19, 11, 0);

        assert!(matches!(svc.live_prices(open).await, Err(AppError::Config(_))));
        assert!(matches!(svc.refresh(open).await, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_refresh_skips_when_closed() {
        let dir = tempfile::tempdir().unwrap();
        let all = tickers(2);
        let provider = Arc::new(all_priced(&all, 1.0));
        let svc = PriceService::new(
            Some(provider.clone() as Arc<dyn QuoteProvider>),
            Arc::new(MemoryStore::new()),
            StaticPriceStore::new(dir.path()),
            all,
            options(FetchStrategy::Sequential),
        );

        let report = svc.refresh(et(2026, 10, 19, 18, 0)).await.unwrap();
        assert!(!report.fetched);
        assert_eq!(report.message, "Market closed - skipping price fetch");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_alternates_groups() {
        let dir = tempfile::tempdir().unwrap();
        let all = tickers(5);
        let shared = Arc::new(MemoryStore::new());
        let svc = service(Some(all_priced(&all, 1.0)), shared.clone(), dir.path(), all.clone(), FetchStrategy::Alternating);
        let open = et(2026, 10, 19, 10, 0);

        let first = svc.refresh(open).await.unwrap();
        assert_eq!(first.group, Some(1));
        assert_eq!(first.requested, 2);
        assert_eq!(first.message, "Updated group 2/2: 2 prices");

        let second = svc.refresh(open + chrono::Duration::minutes(1)).await.unwrap();
        assert_eq!(second.group, Some(0));
        assert_eq!(second.requested, 3);

        let snapshot = shared.load().await.unwrap().unwrap();
        assert_eq!(snapshot.prices.len(), 5);
    }

    #[tokio::test]
    async fn test_failed_ticker_keeps_previous_price() {
        let dir = tempfile::tempdir().unwrap();
        let all = tickers(10);
        let shared = Arc::new(MemoryStore::new());
        let open = et(2026, 10, 19, 10, 0);

        let first = service(Some(all_priced(&all, 10.0)), shared.clone(), dir.path(), all.clone(), FetchStrategy::Sequential);
        first.refresh(open).await.unwrap();

        let second = service(Some(all_priced(&all, 11.0).failing("T7")), shared.clone(), dir.path(), all.clone(), FetchStrategy::Sequential);
        let report = second.refresh(open + chrono::Duration::minutes(1)).await.unwrap();
        assert_eq!(report.updated, 9);

        let snapshot = shared.load().await.unwrap().unwrap();
        assert_eq!(snapshot.prices.len(), 10);
        assert_eq!(snapshot.prices["T7"].price, 10.0);
        assert_eq!(snapshot.prices["T6"].price, 11.0);
    }

    #[tokio::test]
    async fn test_daily_close_fills_gaps_and_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        write_static(dir.path(), &[("T2", 7.5)]);
        let all = tickers(3);
        let provider = all_priced(&all, 20.0).failing("T2").failing("T3");
        let svc = service(Some(provider), Arc::new(MemoryStore::new()), dir.path(), all, FetchStrategy::Sequential);
        let after_close = et(2026, 10, 19, 16, 30);

        let report = svc.record_daily_close(after_close).await.unwrap();
        assert!(report.history_written);
        assert_eq!(report.date, "2026-10-19");
        assert_eq!(report.fetched, 1);
        assert_eq!(report.filled_from_previous, vec!["T2"]);
        assert_eq!(report.missing, vec!["T3"]);

        let current = svc.statics().current().unwrap();
        assert_eq!(current.prices["T1"], 20.0);
        assert_eq!(current.prices["T2"], 7.5);
        assert!(!current.prices.contains_key("T3"));
        let history = svc.statics().history(eastern_date(after_close)).unwrap().unwrap();
        assert_eq!(history, current);

        let again = svc.record_daily_close(after_close).await.unwrap();
        assert!(!again.history_written);
        assert_eq!(again.message, "Daily close already recorded");
    }

    #[tokio::test]
    async fn test_daily_close_skips_outside_window() {
        let dir = tempfile::tempdir().unwrap();
        let all = tickers(1);
        let svc = service(Some(all_priced(&all, 1.0)), Arc::new(MemoryStore::new()), dir.path(), all, FetchStrategy::Sequential);

        let weekend = svc.record_daily_close(et(2026, 10, 18, 17, 0)).await.unwrap();
        assert!(!weekend.history_written);
        let during = svc.record_daily_close(et(2026, 10, 19, 12, 0)).await.unwrap();
        assert!(!during.history_written);
        assert!(svc.statics().current().is_err());
    }

    /// 共享缓存不可用（如 Redis 断开）
    struct UnavailableStore;

    #[async_trait::async_trait]
    impl SharedPriceStore for UnavailableStore {
        async fn load(&self) -> anyhow::Result<Option<PriceSnapshot>> {
            anyhow::bail!("connection refused")
        }

        async fn store(&self, _snapshot: &PriceSnapshot) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }

        async fn next_batch_group(&self) -> anyhow::Result<u64> {
            anyhow::bail!("connection refused")
        }

        fn source(&self) -> PriceSource {
            PriceSource::Redis
        }
    }

    fn with_unavailable_store(provider: MockProvider, dir: &std::path::Path, tickers: Vec<String>) -> PriceService {
        PriceService::new(
            Some(Arc::new(provider)),
            Arc::new(UnavailableStore),
            StaticPriceStore::new(dir),
            tickers,
            options(FetchStrategy::Alternating),
        )
    }

    #[tokio::test]
    async fn test_shared_store_outage_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        write_static(dir.path(), &[("T1", 1.0)]);
        let all = tickers(2);
        let open = et(2026, 10, 19, 11, 0);

        let svc = with_unavailable_store(all_priced(&all, 3.0), dir.path(), all.clone());
        let resp = svc.live_prices(open).await.unwrap();
        assert_eq!(resp.source, PriceSource::Direct);
        assert_eq!(resp.prices.len(), 2);

        let down = with_unavailable_store(MockProvider::default(), dir.path(), all);
        let resp = down.live_prices(open).await.unwrap();
        assert_eq!(resp.source, PriceSource::StaticFallback);
        assert_eq!(resp.prices["T1"].price, 1.0);
    }

    #[tokio::test]
    async fn test_refresh_survives_shared_store_outage() {
        let dir = tempfile::tempdir().unwrap();
        let all = tickers(4);
        let provider = all_priced(&all, 8.0);
        let svc = with_unavailable_store(provider, dir.path(), all.clone());
        let open = et(2026, 10, 19, 10, 0);

        let report = svc.refresh(open).await.unwrap();
        assert!(report.fetched);
        assert_eq!(report.group, Some(0));
        assert_eq!(report.requested, 2);
        assert_eq!(report.updated, 2);

        let resp = svc.live_prices(open + chrono::Duration::seconds(10)).await.unwrap();
        assert_eq!(resp.source, PriceSource::Local);
        assert_eq!(resp.prices.len(), 2);
        assert_eq!(resp.prices["T1"].price, 8.0);
    }

    #[tokio::test]
    async fn test_daily_close_outage_can_be_retried() {
        let dir = tempfile::tempdir().unwrap();
        write_static(dir.path(), &[("T1", 5.0), ("T2", 6.0)]);
        let all = tickers(2);
        let after_close = et(2026, 10, 19, 16, 30);

        let down = service(
            Some(MockProvider::default().failing("T1").failing("T2")),
            Arc::new(MemoryStore::new()),
            dir.path(),
            all.clone(),
            FetchStrategy::Sequential,
        );
        let report = down.record_daily_close(after_close).await.unwrap();
        assert!(!report.history_written);
        assert_eq!(report.fetched, 0);
        assert_eq!(report.missing, vec!["T1", "T2"]);
        assert_eq!(report.message, "No quotes fetched - daily close not recorded");
        assert!(down.statics().history(eastern_date(after_close)).unwrap().is_none());
        assert_eq!(down.statics().current().unwrap().prices["T1"], 5.0);

        let healthy = service(Some(all_priced(&all, 9.0)), Arc::new(MemoryStore::new()), dir.path(), all, FetchStrategy::Sequential);
        let retry = healthy
            .record_daily_close(after_close + chrono::Duration::minutes(30))
            .await
            .unwrap();
        assert!(retry.history_written);
        assert_eq!(retry.fetched, 2);

        let history = healthy.statics().history(eastern_date(after_close)).unwrap().unwrap();
        assert_eq!(history.prices["T1"], 9.0);
        assert_eq!(history.prices["T2"], 9.0);
    }

    #[tokio::test]
    async fn test_cached_prices_never_fetch() {
        let dir = tempfile::tempdir().unwrap();
        write_static(dir.path(), &[("T1", 4.0)]);
        let all = tickers(1);
        let provider = Arc::new(all_priced(&all, 7.0));
        let svc = PriceService::new(
            Some(provider.clone() as Arc<dyn QuoteProvider>),
            Arc::new(MemoryStore::new()),
            StaticPriceStore::new(dir.path()),
            all,
            options(FetchStrategy::Sequential),
        );
        let open = et(2026, 10, 19, 11, 0);

        let resp = svc.cached_prices(open).await;
        assert_eq!(resp.source, PriceSource::StaticFallback);
        assert_eq!(resp.prices["T1"].price, 4.0);
        assert_eq!(provider.call_count(), 0);

        svc.live_prices(open).await.unwrap();
        let resp = svc.cached_prices(open + chrono::Duration::seconds(5)).await;
        assert_eq!(resp.source, PriceSource::Local);
        assert_eq!(resp.prices["T1"].price, 7.0);
        assert_eq!(provider.call_count(), 1);
    }
}
