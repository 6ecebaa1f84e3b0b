//! 比赛数据加载与校验
//!
//! players.json 在启动时加载一次，校验失败则拒绝启动

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::models::{ContestInfo, Player, PlayersData};

/// 比赛数据错误
#[derive(Debug, thiserror::Error)]
pub enum ContestError {
    #[error("读取比赛数据失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("解析比赛数据失败: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("选手 {player} 的股票代码无效: {ticker:?}")]
    InvalidTicker { player: String, ticker: String },

    #[error("选手 {player} 的 {ticker} 基准价无效: {price}")]
    InvalidBasePrice { player: String, ticker: String, price: f64 },

    #[error("选手 {player} 持有 {actual} 只股票，应为 {expected} 只")]
    WrongStockCount { player: String, expected: usize, actual: usize },

    #[error("股票 {ticker} 被 {first} 和 {second} 重复持有")]
    DuplicateTicker { ticker: String, first: String, second: String },

    #[error("选秀顺位 {0} 重复")]
    DuplicateDraftPosition(u32),

    #[error("选手 ID 重复: {0}")]
    DuplicatePlayerId(String),
}

/// 已校验的比赛数据
#[derive(Debug, Clone)]
pub struct Contest {
    info: ContestInfo,
    players: Vec<Player>,
}

impl Contest {
    /// 从 JSON 文件加载并校验
    pub fn from_file<P: AsRef<Path>>(path: P, stocks_per_player: usize) -> Result<Self, ContestError> {
        let content = fs::read_to_string(path)?;
        let data: PlayersData = serde_json::from_str(&content)?;
        Self::new(data, stocks_per_player)
    }

    /// 校验比赛数据
    ///
    /// stocks_per_player 为 0 时不校验持仓数量
    pub fn new(data: PlayersData, stocks_per_player: usize) -> Result<Self, ContestError> {
        let ticker_re = Regex::new(r"^[A-Z][A-Z0-9.\-]{0,9}$").expect("static regex");

        let mut owners: HashMap<&str, &str> = HashMap::new();
        let mut positions = HashSet::new();
        let mut ids = HashSet::new();

        for player in &data.players {
            if !ids.insert(player.id.as_str()) {
                return Err(ContestError::DuplicatePlayerId(player.id.clone()));
            }
            if !positions.insert(player.draft_position) {
                return Err(ContestError::DuplicateDraftPosition(player.draft_position));
            }
            if stocks_per_player > 0 && player.stocks.len() != stocks_per_player {
                return Err(ContestError::WrongStockCount {
                    player: player.name.clone(),
                    expected: stocks_per_player,
                    actual: player.stocks.len(),
                });
            }

            for stock in &player.stocks {
                if !ticker_re.is_match(&stock.ticker) {
                    return Err(ContestError::InvalidTicker {
                        player: player.name.clone(),
                        ticker: stock.ticker.clone(),
                    });
                }
                if !stock.base_price.is_finite() || stock.base_price <= 0.0 {
                    return Err(ContestError::InvalidBasePrice {
                        player: player.name.clone(),
                        ticker: stock.ticker.clone(),
                        price: stock.base_price,
                    });
                }
                if let Some(first) = owners.insert(stock.ticker.as_str(), player.name.as_str()) {
                    return Err(ContestError::DuplicateTicker {
                        ticker: stock.ticker.clone(),
                        first: first.to_string(),
                        second: player.name.clone(),
                    });
                }
            }
        }

        Ok(Self {
            info: data.contest_info,
            players: data.players,
        })
    }

    pub fn info(&self) -> &ContestInfo {
        &self.info
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// 全部股票代码，按选手及持仓顺序去重
    pub fn all_tickers(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.players
            .iter()
            .flat_map(|p| p.stocks.iter())
            .filter(|s| seen.insert(s.ticker.as_str()))
            .map(|s| s.ticker.clone())
            .collect()
    }
}
