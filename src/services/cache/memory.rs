//! 进程内共享存储
//!
//! 未配置 Redis 时使用，由定时任务接口写入

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use super::SharedPriceStore;
use crate::models::{PriceSnapshot, PriceSource};

#[derive(Default)]
pub struct MemoryStore {
    snapshot: RwLock<Option<PriceSnapshot>>,
    batch_counter: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SharedPriceStore for MemoryStore {
    async fn load(&self) -> Result<Option<PriceSnapshot>> {
        Ok(self.snapshot.read().clone())
    }

    async fn store(&self, snapshot: &PriceSnapshot) -> Result<()> {
        *self.snapshot.write() = Some(snapshot.clone());
        Ok(())
    }

    async fn next_batch_group(&self) -> Result<u64> {
        Ok((self.batch_counter.fetch_add(1, Ordering::SeqCst) + 1) % 2)
    }

    fn source(&self) -> PriceSource {
        PriceSource::Cron
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::{open_status, price};
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_batch_group_alternates_starting_at_one() {
        let store = MemoryStore::new();
        assert_eq!(store.next_batch_group().await.unwrap(), 1);
        assert_eq!(store.next_batch_group().await.unwrap(), 0);
        assert_eq!(store.next_batch_group().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_merge_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load().await.unwrap().is_none());

        let mut first = BTreeMap::new();
        first.insert("AAPL".to_string(), price(100.0, 1));
        first.insert("MSFT".to_string(), price(200.0, 1));
        store.merge(&first, open_status(), 1).await.unwrap();

        let mut second = BTreeMap::new();
        second.insert("AAPL".to_string(), price(101.0, 2));
        let merged = store.merge(&second, open_status(), 2).await.unwrap();

        assert_eq!(merged.prices["AAPL"].price, 101.0);
        assert_eq!(merged.prices["MSFT"].price, 200.0);
        assert_eq!(store.load().await.unwrap(), Some(merged));
        assert_eq!(store.source(), PriceSource::Cron);
    }
}
