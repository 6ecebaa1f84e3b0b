//! Redis 共享存储
//!
//! 快照以 JSON 存于单个键，写入时带过期时间；分组计数器使用 INCR 保证多实例下原子递增

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

use super::SharedPriceStore;
use crate::models::{PriceSnapshot, PriceSource};

/// 快照键
const SNAPSHOT_KEY: &str = "stock-prices";
/// 分组计数器键
const BATCH_GROUP_KEY: &str = "last-batch-group";

pub struct RedisStore {
    /// 连接管理器，断线自动重连，可低成本克隆
    conn: ConnectionManager,
    /// 快照过期时间
    ttl: Duration,
}

impl RedisStore {
    /// 连接 Redis
    pub async fn connect(url: &str, ttl: Duration) -> Result<Self> {
        let client = redis::Client::open(url).context("Redis 地址无效")?;
        let conn = client
            .get_connection_manager()
            .await
            .context("连接 Redis 失败")?;

        log::info!("已连接 Redis 共享缓存");
        Ok(Self { conn, ttl })
    }
}

#[async_trait]
impl SharedPriceStore for RedisStore {
    async fn load(&self) -> Result<Option<PriceSnapshot>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(SNAPSHOT_KEY).await?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn store(&self, snapshot: &PriceSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(SNAPSHOT_KEY, json, self.ttl.as_secs().max(1))
            .await?;
        Ok(())
    }

    async fn next_batch_group(&self) -> Result<u64> {
        let mut conn = self.conn.clone();
        let counter: i64 = conn.incr(BATCH_GROUP_KEY, 1).await?;
        Ok(counter.rem_euclid(2) as u64)
    }

    fn source(&self) -> PriceSource {
        PriceSource::Redis
    }
}
