//! 排名数据模型
//!
//! 排名每次请求都重新计算，不做缓存

use serde::{Deserialize, Serialize};

use super::contest::Player;

/// 单只股票收益
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockReturn {
    pub ticker: String,
    pub base_price: f64,
    pub current_price: f64,
    /// 收益率（小数，0.1 表示 10%）
    #[serde(rename = "return")]
    pub return_pct: f64,
}

/// 股票代码及其收益率
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TickerReturn {
    pub ticker: String,
    #[serde(rename = "return")]
    pub return_pct: f64,
}

/// 选手排名
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    /// 名次（从 1 开始）
    pub rank: usize,
    /// 上一交易日名次
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_rank: Option<usize>,
    pub player: Player,
    /// 总收益率（持仓收益率的平均值）
    pub total_return: f64,
    pub stock_returns: Vec<StockReturn>,
    pub best_stock: Option<TickerReturn>,
    pub worst_stock: Option<TickerReturn>,
}

/// 带持有人的股票收益
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OwnedStockReturn {
    #[serde(flatten)]
    pub stock: StockReturn,
    pub owner_id: String,
    pub owner: String,
}

/// 组合波动（最佳与最差股票收益之差）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSpread {
    pub player_id: String,
    pub player: String,
    pub spread: f64,
}

/// 比赛统计
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContestStats {
    pub leader: Option<Standing>,
    pub best_stock: Option<OwnedStockReturn>,
    pub worst_stock: Option<OwnedStockReturn>,
    pub most_volatile: Option<PortfolioSpread>,
    /// 距比赛结束天数
    pub days_remaining: i64,
}

/// 对比胜者
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Player1,
    Player2,
    Tie,
}

/// 两名选手对比结果
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub player1: Standing,
    pub player2: Standing,
    pub return_winner: Winner,
    pub best_stock_winner: Winner,
    pub positive_count1: usize,
    pub positive_count2: usize,
    pub positive_winner: Winner,
}

/// 全部持仓股票看板
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockBoard {
    /// 按收益率从高到低排列
    pub stocks: Vec<OwnedStockReturn>,
    pub gainers: usize,
    pub losers: usize,
    pub average_return: f64,
}
