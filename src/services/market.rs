//! 美股交易时间判断
//!
//! 交易时间：美东时间周一至周五 9:30 - 16:00，不处理节假日

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc, Weekday};
use chrono_tz::America::New_York;
use chrono_tz::Tz;

use crate::models::MarketStatus;

/// 开盘时间（分钟）
const MARKET_OPEN_MINUTES: u32 = 9 * 60 + 30;
/// 收盘时间（分钟）
const MARKET_CLOSE_MINUTES: u32 = 16 * 60;

/// 获取美东时间
pub fn eastern_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&New_York)
}

/// 转换为美东时间
pub fn to_eastern(now: DateTime<Utc>) -> DateTime<Tz> {
    now.with_timezone(&New_York)
}

/// 美东日期，用于静态收盘价文件名
pub fn eastern_date(now: DateTime<Utc>) -> NaiveDate {
    to_eastern(now).date_naive()
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

/// 是否为交易日（仅排除周末）
pub fn is_trading_day(now: DateTime<Utc>) -> bool {
    !is_weekend(to_eastern(now).weekday())
}

/// 判断美股当前是否开盘
pub fn is_market_open(now: DateTime<Utc>) -> bool {
    let et = to_eastern(now);
    if is_weekend(et.weekday()) {
        return false;
    }
    let minutes = et.hour() * 60 + et.minute();
    (MARKET_OPEN_MINUTES..MARKET_CLOSE_MINUTES).contains(&minutes)
}

/// 交易日收盘之后（用于记录每日收盘价）
pub fn is_after_close(now: DateTime<Utc>) -> bool {
    let et = to_eastern(now);
    !is_weekend(et.weekday()) && et.hour() * 60 + et.minute() >= MARKET_CLOSE_MINUTES
}

/// 获取市场状态及说明
pub fn market_status(now: DateTime<Utc>) -> MarketStatus {
    let et = to_eastern(now);

    let message = if is_market_open(now) {
        "Market Open"
    } else if is_weekend(et.weekday()) {
        "Weekend - Market Closed"
    } else if et.hour() * 60 + et.minute() < MARKET_OPEN_MINUTES {
        "Pre-Market"
    } else {
        "After Hours"
    };

    MarketStatus {
        is_open: message == "Market Open",
        message: message.to_string(),
    }
}

#[cfg(test)]
pub(crate) fn et(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    use chrono::TimeZone;
    New_York
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .expect("unambiguous eastern time")
        .with_timezone(&Utc)
}
