//! 报价获取模块
//!
//! 逐只请求报价接口，单只失败不影响其他股票

mod finnhub;

pub use finnhub::{FinnhubClient, FINNHUB_BASE_URL};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::models::Quote;

/// 报价数据源
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// 获取单只股票报价
    ///
    /// 代码无效时返回 Ok(None)，网络或接口错误返回 Err
    async fn quote(&self, symbol: &str) -> Result<Option<Quote>>;
}

/// 拉取策略
///
/// sequential：每次拉取全部股票；alternating：每次只拉取一半，两组轮换
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    Sequential,
    #[default]
    Alternating,
}

/// 依次获取多只股票报价
///
/// 每次请求之间间隔 delay（最后一次之后不等待），失败的股票不出现在结果中
pub async fn fetch_quotes(
    provider: &dyn QuoteProvider,
    symbols: &[String],
    delay: Duration,
) -> BTreeMap<String, Quote> {
    let mut results = BTreeMap::new();

    for (i, symbol) in symbols.iter().enumerate() {
        match provider.quote(symbol).await {
            Ok(Some(quote)) => {
                results.insert(symbol.clone(), quote);
            }
            Ok(None) => log::warn!("{} 无有效报价，跳过", symbol),
            Err(e) => log::warn!("获取 {} 报价失败: {:#}", symbol, e),
        }

        if i + 1 < symbols.len() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    log::debug!("报价获取完成: {}/{}", results.len(), symbols.len());
    results
}

/// 按分组取出本次要拉取的股票
///
/// 以 ceil(n/2) 为界分成两组，group 为偶数取前半，奇数取后半
pub fn batch_for_group(tickers: &[String], group: u64) -> &[String] {
    let midpoint = tickers.len().div_ceil(2);
    if group % 2 == 0 {
        &tickers[..midpoint]
    } else {
        &tickers[midpoint..]
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockProvider;
    use super::*;

    fn tickers(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("T{}", i)).collect()
    }

    #[tokio::test]
    async fn test_failed_ticker_is_omitted() {
        let symbols = tickers(10);
        let prices: Vec<(&str, f64)> = symbols.iter().map(|s| (s.as_str(), 10.0)).collect();
        let provider = MockProvider::with_prices(&prices).failing("T7");

        let quotes = fetch_quotes(&provider, &symbols, Duration::ZERO).await;

        assert_eq!(quotes.len(), 9);
        assert!(!quotes.contains_key("T7"));
        assert_eq!(provider.call_count(), 10);
    }

    #[tokio::test]
    async fn test_invalid_symbol_is_omitted() {
        let provider = MockProvider::with_prices(&[("AAPL", 110.0)]);
        let symbols = vec!["AAPL".to_string(), "ZZZZ".to_string()];

        let quotes = fetch_quotes(&provider, &symbols, Duration::ZERO).await;

        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes["AAPL"].price, 110.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_calls_only() {
        let symbols = tickers(3);
        let prices: Vec<(&str, f64)> = symbols.iter().map(|s| (s.as_str(), 1.0)).collect();
        let provider = MockProvider::with_prices(&prices);

        let start = tokio::time::Instant::now();
        fetch_quotes(&provider, &symbols, Duration::from_secs(1)).await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
    }

    #[test]
    fn test_batch_halves() {
        let all = tickers(5);
        assert_eq!(batch_for_group(&all, 0), &all[..3]);
        assert_eq!(batch_for_group(&all, 1), &all[3..]);
        assert_eq!(batch_for_group(&all, 2), &all[..3]);

        let even = tickers(4);
        assert_eq!(batch_for_group(&even, 1).len(), 2);
        assert!(batch_for_group(&[], 1).is_empty());
    }

    #[test]
    fn test_strategy_from_config_string() {
        let s: FetchStrategy = serde_json::from_str("\"sequential\"").unwrap();
        assert_eq!(s, FetchStrategy::Sequential);
        assert_eq!(FetchStrategy::default(), FetchStrategy::Alternating);
    }
}
