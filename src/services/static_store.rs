//! 静态收盘价文件
//!
//! 目录结构：
//! - currentPrices.json：最近一个交易日的收盘价，所有缓存层失效时的默认回退
//! - history/YYYY-MM-DD.json：每个交易日写入一次，之后不再修改

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::models::StaticPrices;

const CURRENT_FILE: &str = "currentPrices.json";
const HISTORY_DIR: &str = "history";

pub struct StaticPriceStore {
    root: PathBuf,
}

impl StaticPriceStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn current_path(&self) -> PathBuf {
        self.root.join(CURRENT_FILE)
    }

    fn history_dir(&self) -> PathBuf {
        self.root.join(HISTORY_DIR)
    }

    fn history_path(&self, date: NaiveDate) -> PathBuf {
        self.history_dir().join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    /// 读取当前收盘价
    pub fn current(&self) -> Result<StaticPrices> {
        read_json(&self.current_path())
    }

    /// 读取当前收盘价，文件缺失或损坏时返回空数据
    pub fn current_or_empty(&self) -> StaticPrices {
        match self.current() {
            Ok(prices) => prices,
            Err(e) => {
                log::warn!("读取静态收盘价失败: {:#}", e);
                StaticPrices::default()
            }
        }
    }

    /// 覆盖写入当前收盘价
    pub fn write_current(&self, prices: &StaticPrices) -> Result<()> {
        write_json(&self.current_path(), prices)
    }

    /// 读取某日收盘价，不存在时返回 None
    pub fn history(&self, date: NaiveDate) -> Result<Option<StaticPrices>> {
        match fs::read_to_string(self.history_path(date)) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入某日收盘价
    ///
    /// 历史文件只写一次，已存在时不覆盖并返回 false
    pub fn write_history(&self, date: NaiveDate, prices: &StaticPrices) -> Result<bool> {
        let path = self.history_path(date);
        if path.exists() {
            return Ok(false);
        }
        fs::create_dir_all(self.history_dir())?;
        write_json(&path, prices)?;
        Ok(true)
    }

    /// 已有历史收盘价的日期，升序
    pub fn history_dates(&self) -> Result<Vec<NaiveDate>> {
        let entries = match fs::read_dir(self.history_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut dates: Vec<NaiveDate> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let stem = name.to_str()?.strip_suffix(".json")?.to_string();
                NaiveDate::parse_from_str(&stem, "%Y-%m-%d").ok()
            })
            .collect();
        dates.sort();
        Ok(dates)
    }

    /// 指定日期之前最近一个交易日的收盘价
    pub fn latest_before(&self, date: NaiveDate) -> Result<Option<(NaiveDate, StaticPrices)>> {
        let previous = self
            .history_dates()?
            .into_iter()
            .filter(|d| *d < date)
            .last();

        match previous {
            Some(d) => Ok(self.history(d)?.map(|prices| (d, prices))),
            None => Ok(None),
        }
    }
}

fn read_json(path: &Path) -> Result<StaticPrices> {
    let content =
        fs::read_to_string(path).with_context(|| format!("读取 {} 失败", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("解析 {} 失败", path.display()))
}

fn write_json(path: &Path, prices: &StaticPrices) -> Result<()> {
    let json = serde_json::to_string_pretty(prices)?;
    fs::write(path, json).with_context(|| format!("写入 {} 失败", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn prices(entries: &[(&str, f64)]) -> StaticPrices {
        StaticPrices {
            last_updated: "2026-10-16T20:30:00Z".to_string(),
            prices: entries.iter().map(|(t, p)| (t.to_string(), *p)).collect::<BTreeMap<_, _>>(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_current_round_trip_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = StaticPriceStore::new(dir.path());

        assert!(store.current().is_err());
        assert_eq!(store.current_or_empty(), StaticPrices::default());

        let data = prices(&[("AAPL", 250.0)]);
        store.write_current(&data).unwrap();
        assert_eq!(store.current().unwrap(), data);
    }

    #[test]
    fn test_history_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = StaticPriceStore::new(dir.path());
        let day = date("2026-10-16");

        assert!(store.history(day).unwrap().is_none());
        assert!(store.write_history(day, &prices(&[("AAPL", 250.0)])).unwrap());
        assert!(!store.write_history(day, &prices(&[("AAPL", 1.0)])).unwrap());

        assert_eq!(store.history(day).unwrap().unwrap().prices["AAPL"], 250.0);
    }

    #[test]
    fn test_history_dates_and_latest_before() {
        let dir = tempfile::tempdir().unwrap();
        let store = StaticPriceStore::new(dir.path());
        assert!(store.history_dates().unwrap().is_empty());

        for d in ["2026-10-15", "2026-10-13", "2026-10-14"] {
            store.write_history(date(d), &prices(&[("AAPL", 1.0)])).unwrap();
        }
        fs::write(store.history_dir().join("notes.txt"), "ignored").unwrap();

        let dates = store.history_dates().unwrap();
        assert_eq!(dates, vec![date("2026-10-13"), date("2026-10-14"), date("2026-10-15")]);

        let (prev, _) = store.latest_before(date("2026-10-15")).unwrap().unwrap();
        assert_eq!(prev, date("2026-10-14"));
        assert!(store.latest_before(date("2026-10-13")).unwrap().is_none());
    }
}
