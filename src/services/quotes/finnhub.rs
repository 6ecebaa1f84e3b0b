//! Finnhub 报价接口实现
//!
//! 对接 GET https://finnhub.io/api/v1/quote?symbol=<T>&token=<K>
//! 免费额度为每分钟 60 次请求

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::QuoteProvider;
use crate::models::Quote;

/// Finnhub 默认地址
pub const FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";

/// Finnhub quote 接口原始响应
///
/// 无效代码返回 { c: 0, d: null, dp: null, ... }
#[derive(Debug, Deserialize)]
struct FinnhubQuote {
    /// 当前价格
    c: Option<f64>,
    /// 涨跌额
    d: Option<f64>,
    /// 涨跌幅
    dp: Option<f64>,
    /// 最高价
    h: Option<f64>,
    /// 最低价
    l: Option<f64>,
    /// 开盘价
    o: Option<f64>,
    /// 昨收价
    pc: Option<f64>,
}

/// Finnhub 报价客户端
pub struct FinnhubClient {
    /// HTTP 客户端
    client: Client,
    /// 接口地址
    base_url: Url,
    /// API Key
    api_key: String,
}

impl FinnhubClient {
    /// 创建客户端
    ///
    /// timeout 为单次请求超时，超时只影响当前股票
    pub fn new(
        base_url: &str,
        api_key: String,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        // 保证以 / 结尾，join 时才不会丢掉路径的最后一段
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };

        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
            api_key,
        })
    }

    /// 构造 quote 请求地址
    fn quote_url(&self, symbol: &str) -> Result<Url> {
        let mut url = self.base_url.join("quote")?;
        url.query_pairs_mut()
            .append_pair("symbol", symbol)
            .append_pair("token", &self.api_key);
        Ok(url)
    }
}

/// 将 Finnhub 响应转换为报价，当前价为 0 或空时视为无效代码
fn parse_quote(symbol: &str, raw: FinnhubQuote) -> Option<Quote> {
    let price = raw.c.filter(|c| c.is_finite() && *c > 0.0)?;

    Some(Quote {
        ticker: symbol.to_string(),
        price,
        change: raw.d.unwrap_or(0.0),
        change_percent: raw.dp.unwrap_or(0.0),
        high: raw.h.unwrap_or(0.0),
        low: raw.l.unwrap_or(0.0),
        open: raw.o.unwrap_or(0.0),
        previous_close: raw.pc.unwrap_or(0.0),
    })
}

#[async_trait]
impl QuoteProvider for FinnhubClient {
    async fn quote(&self, symbol: &str) -> Result<Option<Quote>> {
        let url = self.quote_url(symbol)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            log::warn!("Finnhub 限流: {}", symbol);
            return Err(anyhow!("Finnhub 限流 (429)"));
        }
        if !status.is_success() {
            return Err(anyhow!("获取报价失败: {}", status));
        }

        let raw: FinnhubQuote = response.json().await?;
        Ok(parse_quote(symbol, raw))
    }
}
