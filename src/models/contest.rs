//! 比赛数据模型
//!
//! 定义选手、持仓股票和比赛信息

use serde::{Deserialize, Serialize};

/// 持仓股票
///
/// base_price 为比赛开始时确定的基准价，之后不再变化
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    /// 股票代码（如 AAPL）
    pub ticker: String,
    /// 基准价
    pub base_price: f64,
}

/// 参赛选手
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// 选手 ID（URL 中使用）
    pub id: String,
    /// 选手名称
    pub name: String,
    /// 选秀顺位（1..10）
    pub draft_position: u32,
    /// 持仓股票，按选秀顺序排列
    pub stocks: Vec<Stock>,
}

/// 比赛信息
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ContestInfo {
    pub name: String,
    /// 开始日期（YYYY-MM-DD）
    pub start_date: String,
    /// 结束日期（YYYY-MM-DD）
    pub end_date: String,
    /// 奖金
    pub prize_amount: f64,
    /// 基准价日期
    pub base_price_date: String,
    /// 计分规则说明
    pub scoring: String,
}

/// players.json 文件内容
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PlayersData {
    pub contest_info: ContestInfo,
    pub players: Vec<Player>,
}
