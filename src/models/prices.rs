//! 价格数据模型
//!
//! 定义实时报价、价格快照、静态收盘价和市场状态

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单只股票实时报价
///
/// 由报价服务返回，字段对应 Finnhub quote 接口
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// 股票代码
    pub ticker: String,
    /// 当前价格
    pub price: f64,
    /// 涨跌额
    pub change: f64,
    /// 涨跌幅（百分比）
    pub change_percent: f64,
    /// 当日最高价
    pub high: f64,
    /// 当日最低价
    pub low: f64,
    /// 开盘价
    pub open: f64,
    /// 昨收价
    pub previous_close: f64,
}

/// 缓存中的单只股票价格
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CachedPrice {
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    /// 该价格的获取时间（毫秒时间戳）
    pub updated_at: i64,
}

impl CachedPrice {
    /// 由报价生成缓存价格
    pub fn from_quote(quote: &Quote, updated_at: i64) -> Self {
        Self {
            price: quote.price,
            change: quote.change,
            change_percent: quote.change_percent,
            updated_at,
        }
    }
}

/// 市场状态
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MarketStatus {
    /// 是否开盘
    pub is_open: bool,
    /// 状态说明
    pub message: String,
}

/// 价格快照
///
/// 整体替换语义：一个快照对应一个时间戳，按股票代码合并更新
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    /// 股票代码 -> 价格
    pub prices: BTreeMap<String, CachedPrice>,
    /// 快照时间（毫秒时间戳）
    pub timestamp: i64,
    /// 写入时的市场状态
    pub market_status: MarketStatus,
}

/// 静态收盘价文件内容
///
/// 对应 currentPrices.json 以及 history/YYYY-MM-DD.json
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StaticPrices {
    /// 更新时间（RFC 3339）
    pub last_updated: String,
    /// 股票代码 -> 收盘价
    pub prices: BTreeMap<String, f64>,
}

/// 价格数据来源
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PriceSource {
    /// 共享缓存（Redis）
    Redis,
    /// 静态收盘价（休市）
    Static,
    /// 静态收盘价（所有缓存层都不可用）
    StaticFallback,
    /// 定时任务写入的进程内共享缓存
    Cron,
    /// 本次请求直接从报价服务获取
    Direct,
    /// 本地缓存
    Local,
    /// 过期的本地缓存
    LocalStale,
}

/// 实时价格接口中的单只股票价格
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LivePrice {
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
    pub updated_at: i64,
}

/// GET /prices/live 响应体
///
/// 降级情况通过 source/cached/stale 字段体现，而不是错误码
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LivePricesResponse {
    pub prices: BTreeMap<String, LivePrice>,
    pub timestamp: i64,
    pub market_status: MarketStatus,
    pub cached: bool,
    pub source: PriceSource,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LivePricesResponse {
    /// 股票代码 -> 价格，供排名计算使用
    pub fn price_map(&self) -> BTreeMap<String, f64> {
        self.prices
            .iter()
            .map(|(ticker, p)| (ticker.clone(), p.price))
            .collect()
    }
}

/// 定时刷新任务结果
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    /// 是否执行了拉取
    pub fetched: bool,
    pub message: String,
    pub market_status: MarketStatus,
    /// 本次拉取的分组（0 或 1），顺序模式下为空
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<u64>,
    /// 请求的股票数
    pub requested: usize,
    /// 成功更新的股票数
    pub updated: usize,
    pub timestamp: i64,
}

/// 每日收盘价记录结果
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DailyCloseReport {
    /// 交易日（YYYY-MM-DD，美东时间）
    pub date: String,
    /// 是否写入了历史文件
    pub history_written: bool,
    /// 成功拉取的股票数
    pub fetched: usize,
    /// 使用旧价格补齐的股票
    pub filled_from_previous: Vec<String>,
    /// 仍然缺失价格的股票
    pub missing: Vec<String>,
    pub message: String,
}
