//! 价格缓存
//!
//! 两层缓存：
//! - 本地缓存（PriceCache）：进程内最近一次成功获取的快照，TTL 较短
//! - 共享缓存（SharedPriceStore）：Redis 或进程内存，由定时任务写入
//!
//! 缓存只保存一个快照，按股票代码合并，不做逐键过期或淘汰

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::models::{CachedPrice, MarketStatus, PriceSnapshot, PriceSource};

impl PriceSnapshot {
    /// 创建空快照
    pub fn empty(market_status: MarketStatus, timestamp: i64) -> Self {
        Self {
            prices: BTreeMap::new(),
            timestamp,
            market_status,
        }
    }

    /// 合并新价格
    ///
    /// 同一代码新值覆盖旧值，未出现在 updates 中的代码保留原值，时间戳更新为 now_ms
    pub fn merge(
        &mut self,
        updates: &BTreeMap<String, CachedPrice>,
        market_status: MarketStatus,
        now_ms: i64,
    ) {
        for (ticker, price) in updates {
            self.prices.insert(ticker.clone(), price.clone());
        }
        self.timestamp = now_ms;
        self.market_status = market_status;
    }

    /// 快照是否未过期
    pub fn is_fresh(&self, now_ms: i64, ttl: Duration) -> bool {
        let age = now_ms.saturating_sub(self.timestamp);
        age >= 0 && (age as u128) < ttl.as_millis()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// 本地缓存查询结果
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// 开盘且未过期
    Fresh(PriceSnapshot),
    /// 有数据但已过期或已休市，需要回退
    Stale(PriceSnapshot),
    /// 无数据，需要回退
    Empty,
}

/// 本地价格缓存
///
/// 进程内只有一个实例，通过 get/update 访问
pub struct PriceCache {
    snapshot: RwLock<Option<PriceSnapshot>>,
    ttl: Duration,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            snapshot: RwLock::new(None),
            ttl,
        }
    }

    /// 最近一次的快照
    pub fn get(&self) -> Option<PriceSnapshot> {
        self.snapshot.read().clone()
    }

    /// 合并部分价格并返回合并后的快照
    pub fn update(
        &self,
        updates: &BTreeMap<String, CachedPrice>,
        market_status: MarketStatus,
        now_ms: i64,
    ) -> PriceSnapshot {
        let mut guard = self.snapshot.write();
        let snapshot = guard.get_or_insert_with(|| PriceSnapshot::empty(market_status.clone(), now_ms));
        snapshot.merge(updates, market_status, now_ms);
        snapshot.clone()
    }

    /// 按新鲜度查询：只有开盘且未超过 TTL 才算有效
    pub fn lookup(&self, now_ms: i64, market_open: bool) -> CacheLookup {
        match self.get() {
            Some(s) if market_open && !s.is_empty() && s.is_fresh(now_ms, self.ttl) => CacheLookup::Fresh(s),
            Some(s) if !s.is_empty() => CacheLookup::Stale(s),
            _ => CacheLookup::Empty,
        }
    }
}

/// 共享价格存储
///
/// 实现需保证整个快照的读写是原子的，分组计数器的自增也是原子的
#[async_trait]
pub trait SharedPriceStore: Send + Sync {
    /// 读取快照
    async fn load(&self) -> Result<Option<PriceSnapshot>>;

    /// 整体写入快照
    async fn store(&self, snapshot: &PriceSnapshot) -> Result<()>;

    /// 读取-合并-写回，返回合并后的快照
    async fn merge(
        &self,
        updates: &BTreeMap<String, CachedPrice>,
        market_status: MarketStatus,
        now_ms: i64,
    ) -> Result<PriceSnapshot> {
        let mut snapshot = self
            .load()
            .await?
            .unwrap_or_else(|| PriceSnapshot::empty(market_status.clone(), now_ms));
        snapshot.merge(updates, market_status, now_ms);
        self.store(&snapshot).await?;
        Ok(snapshot)
    }

    /// 推进分组计数器，返回本次分组（0 或 1）
    async fn next_batch_group(&self) -> Result<u64>;

    /// 命中该层时响应中的数据来源
    fn source(&self) -> PriceSource;
}

#[cfg(test)]
pub(crate) fn price(p: f64, at: i64) -> CachedPrice {
    CachedPrice {
        price: p,
        change: 0.0,
        change_percent: 0.0,
        updated_at: at,
    }
}

#[cfg(test)]
pub(crate) fn open_status() -> MarketStatus {
    MarketStatus {
        is_open: true,
        message: "Market Open".to_string(),
    }
}
