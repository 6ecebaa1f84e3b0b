//! 排名计算
//!
//! 纯函数：相同输入得到相同输出，不依赖当前时间

use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::models::{
    Comparison, ContestStats, OwnedStockReturn, Player, PortfolioSpread, Standing, StockBoard,
    StockReturn, TickerReturn, Winner,
};

/// 单只股票收益率
pub fn stock_return(base_price: f64, current_price: f64) -> f64 {
    (current_price - base_price) / base_price
}

/// 当前价格，缺失或无效时按基准价计算（收益为 0）
fn current_price_for(prices: &BTreeMap<String, f64>, ticker: &str, base_price: f64) -> f64 {
    prices
        .get(ticker)
        .copied()
        .filter(|p| p.is_finite() && *p > 0.0)
        .unwrap_or(base_price)
}

/// 取第一个满足比较条件的股票，相同收益保留先出现者
fn pick_by(returns: &[StockReturn], better: impl Fn(f64, f64) -> bool) -> Option<TickerReturn> {
    let first = returns.first()?;
    let chosen = returns[1..].iter().fold(first, |acc, s| {
        if better(s.return_pct, acc.return_pct) {
            s
        } else {
            acc
        }
    });
    Some(TickerReturn {
        ticker: chosen.ticker.clone(),
        return_pct: chosen.return_pct,
    })
}

fn standing_for(player: &Player, prices: &BTreeMap<String, f64>) -> Standing {
    let stock_returns: Vec<StockReturn> = player
        .stocks
        .iter()
        .map(|stock| {
            let current_price = current_price_for(prices, &stock.ticker, stock.base_price);
            StockReturn {
                ticker: stock.ticker.clone(),
                base_price: stock.base_price,
                current_price,
                return_pct: stock_return(stock.base_price, current_price),
            }
        })
        .collect();

    let total_return = if stock_returns.is_empty() {
        0.0
    } else {
        stock_returns.iter().map(|s| s.return_pct).sum::<f64>() / stock_returns.len() as f64
    };

    Standing {
        rank: 0,
        previous_rank: None,
        player: player.clone(),
        total_return,
        best_stock: pick_by(&stock_returns, |a, b| a > b),
        worst_stock: pick_by(&stock_returns, |a, b| a < b),
        stock_returns,
    }
}

/// 计算排名
///
/// 按总收益率降序稳定排序，名次为 1..N；收益相同时保持输入顺序
pub fn calculate_standings(
    players: &[Player],
    prices: &BTreeMap<String, f64>,
    previous_ranks: Option<&HashMap<String, usize>>,
) -> Vec<Standing> {
    let mut standings: Vec<Standing> = players.iter().map(|p| standing_for(p, prices)).collect();

    standings.sort_by(|a, b| {
        b.total_return
            .partial_cmp(&a.total_return)
            .unwrap_or(Ordering::Equal)
    });

    for (i, standing) in standings.iter_mut().enumerate() {
        standing.rank = i + 1;
        standing.previous_rank = previous_ranks.and_then(|ranks| ranks.get(&standing.player.id).copied());
    }

    standings
}

/// 选手 ID -> 名次
pub fn rank_map(standings: &[Standing]) -> HashMap<String, usize> {
    standings
        .iter()
        .map(|s| (s.player.id.clone(), s.rank))
        .collect()
}

/// 静态收盘价叠加实时价格，实时价格优先
pub fn effective_prices(
    static_prices: &BTreeMap<String, f64>,
    live_prices: &BTreeMap<String, f64>,
) -> BTreeMap<String, f64> {
    let mut merged = static_prices.clone();
    for (ticker, price) in live_prices {
        merged.insert(ticker.clone(), *price);
    }
    merged
}

fn owned_returns(standings: &[Standing]) -> Vec<OwnedStockReturn> {
    standings
        .iter()
        .flat_map(|s| {
            s.stock_returns.iter().map(move |sr| OwnedStockReturn {
                stock: sr.clone(),
                owner_id: s.player.id.clone(),
                owner: s.player.name.clone(),
            })
        })
        .collect()
}

/// 比赛统计：领先者、全场最佳/最差股票、波动最大的组合、剩余天数
pub fn contest_stats(standings: &[Standing], today: NaiveDate, end_date: Option<NaiveDate>) -> ContestStats {
    let all = owned_returns(standings);

    let mut best: Option<&OwnedStockReturn> = None;
    let mut worst: Option<&OwnedStockReturn> = None;
    for stock in &all {
        if best.map_or(true, |b| stock.stock.return_pct > b.stock.return_pct) {
            best = Some(stock);
        }
        if worst.map_or(true, |w| stock.stock.return_pct < w.stock.return_pct) {
            worst = Some(stock);
        }
    }

    let mut most_volatile: Option<PortfolioSpread> = None;
    for s in standings {
        if let (Some(b), Some(w)) = (&s.best_stock, &s.worst_stock) {
            let spread = b.return_pct - w.return_pct;
            if most_volatile.as_ref().map_or(true, |m| spread > m.spread) {
                most_volatile = Some(PortfolioSpread {
                    player_id: s.player.id.clone(),
                    player: s.player.name.clone(),
                    spread,
                });
            }
        }
    }

    ContestStats {
        leader: standings.first().cloned(),
        best_stock: best.cloned(),
        worst_stock: worst.cloned(),
        most_volatile,
        days_remaining: end_date.map_or(0, |end| (end - today).num_days().max(0)),
    }
}

fn winner(a: f64, b: f64) -> Winner {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => Winner::Player1,
        Some(Ordering::Less) => Winner::Player2,
        _ => Winner::Tie,
    }
}

/// 两名选手对比，任一选手不存在时返回 None
pub fn compare(standings: &[Standing], player1: &str, player2: &str) -> Option<Comparison> {
    let p1 = standings.iter().find(|s| s.player.id == player1)?;
    let p2 = standings.iter().find(|s| s.player.id == player2)?;

    let best = |s: &Standing| s.best_stock.as_ref().map_or(0.0, |b| b.return_pct);
    let positives = |s: &Standing| s.stock_returns.iter().filter(|r| r.return_pct >= 0.0).count();

    let positive_count1 = positives(p1);
    let positive_count2 = positives(p2);

    Some(Comparison {
        return_winner: winner(p1.total_return, p2.total_return),
        best_stock_winner: winner(best(p1), best(p2)),
        positive_winner: winner(positive_count1 as f64, positive_count2 as f64),
        positive_count1,
        positive_count2,
        player1: p1.clone(),
        player2: p2.clone(),
    })
}

/// 全部持仓按收益率降序排列
pub fn stock_board(standings: &[Standing]) -> StockBoard {
    let mut stocks = owned_returns(standings);
    stocks.sort_by(|a, b| {
        b.stock
            .return_pct
            .partial_cmp(&a.stock.return_pct)
            .unwrap_or(Ordering::Equal)
    });

    let gainers = stocks.iter().filter(|s| s.stock.return_pct >= 0.0).count();
    let average_return = if stocks.is_empty() {
        0.0
    } else {
        stocks.iter().map(|s| s.stock.return_pct).sum::<f64>() / stocks.len() as f64
    };

    StockBoard {
        gainers,
        losers: stocks.len() - gainers,
        average_return,
        stocks,
    }
}
