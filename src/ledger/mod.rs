//! # 金價帳本
//!
//! 帳本是一個 JSON 陣列檔案，以 (source, date, purity) 為唯一鍵，
//! 每次執行讀入整份、更新或新增記錄後整份寫回。
//!
//! - 新增：`created_*` 為戳記，`modified_*` 為 null
//! - 價格變動：更新 `price_per_gm` 與 `modified_*`
//! - 價格相同：不做任何事

use std::{
    collections::HashMap,
    fmt,
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde_json::Value;

pub use crate::ledger::record::{AuditStamp, LedgerRecord, RecordKey};
use crate::{crawler::GoldQuote, declare::Purity, logging, util::map::Keyable, util::text};

/// 帳本記錄與稽核戳記
pub mod record;

/// 單筆寫入的結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
    Unchanged,
}

/// 一次寫入報價的統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertStats {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// 價格不是數字或純度不在允許清單內而略過的筆數
    pub skipped: usize,
}

impl UpsertStats {
    /// 帳本內容是否有變動
    pub fn changed(&self) -> bool {
        self.inserted + self.updated > 0
    }

    fn count(&mut self, upsert: Upsert) {
        match upsert {
            Upsert::Inserted => self.inserted += 1,
            Upsert::Updated => self.updated += 1,
            Upsert::Unchanged => self.unchanged += 1,
        }
    }
}

impl fmt::Display for UpsertStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inserted: {}, updated: {}, unchanged: {}, skipped: {}",
            self.inserted, self.updated, self.unchanged, self.skipped
        )
    }
}

pub struct Ledger {
    path: PathBuf,
    records: Vec<LedgerRecord>,
    /// 鍵 => records 的索引，重複的鍵以第一筆為準
    index: HashMap<RecordKey, usize>,
}

impl Ledger {
    /// 讀入帳本
    ///
    /// 檔案不存在、無法讀取或不是 JSON 陣列時視為空帳本；
    /// 不符合記錄格式的項目略過。有內容被捨棄時，原檔先複製為 `<name>.corrupt`，
    /// 複製失敗才回傳錯誤，避免寫回時把無法復原的資料蓋掉。
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(why) if why.kind() == ErrorKind::NotFound => {
                logging::info_file_async(format!(
                    "The ledger {} does not exist, starting empty",
                    path.display()
                ));
                return Ok(Self::from_records(path, Vec::new()));
            }
            Err(why) => {
                logging::warn_file_async(format!(
                    "Failed to read the ledger {}, starting empty. because {:?}",
                    path.display(),
                    why
                ));
                return Ok(Self::from_records(path, Vec::new()));
            }
        };

        let (records, dropped) = parse_records(&bytes);
        if dropped > 0 {
            let backup = sibling_path(path, ".corrupt");
            logging::warn_file_async(format!(
                "The ledger {} has {} unreadable entries, a copy is kept at {}",
                path.display(),
                dropped,
                backup.display()
            ));
            fs::copy(path, &backup).with_context(|| {
                format!("Failed to copy {} to {}", path.display(), backup.display())
            })?;
        }

        Ok(Self::from_records(path, records))
    }

    pub fn from_records(path: &Path, records: Vec<LedgerRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            index.entry(record.key()).or_insert(i);
        }

        Ledger {
            path: path.to_path_buf(),
            records,
            index,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[LedgerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &RecordKey) -> Option<&LedgerRecord> {
        self.index.get(key).map(|i| &self.records[*i])
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.index.contains_key(key)
    }

    /// 依鍵更新價格，不存在時新增在最後
    pub fn upsert(&mut self, key: RecordKey, price_per_gm: i64, stamp: &AuditStamp) -> Upsert {
        if let Some(i) = self.index.get(&key) {
            if self.records[*i].set_price(price_per_gm, stamp) {
                return Upsert::Updated;
            }

            return Upsert::Unchanged;
        }

        self.push(key, price_per_gm, stamp);
        Upsert::Inserted
    }

    /// 只在鍵不存在時新增，既有記錄不會被改動
    pub fn insert_if_absent(&mut self, key: RecordKey, price_per_gm: i64, stamp: &AuditStamp) -> bool {
        if self.contains(&key) {
            return false;
        }

        self.push(key, price_per_gm, stamp);
        true
    }

    /// 將成功的報價寫入帳本
    ///
    /// 只寫入 `allowed` 內的純度；價格去掉千分位與小數後不是數字的直接略過。
    /// 報價沒有日期時使用戳記當天的日期。
    pub fn upsert_quotes(
        &mut self,
        quotes: &[GoldQuote],
        allowed: &[Purity],
        stamp: &AuditStamp,
    ) -> UpsertStats {
        let mut stats = UpsertStats::default();

        for quote in quotes.iter().filter(|q| q.success) {
            let date = quote.observed_date.unwrap_or_else(|| stamp.today());

            for (label, raw_price) in &quote.rates {
                let Some(purity) = allowed.iter().find(|p| p.label() == label.as_str()) else {
                    stats.skipped += 1;
                    continue;
                };

                let price = match text::parse_price_per_gram(raw_price) {
                    Ok(price) => price,
                    Err(why) => {
                        logging::debug_file_async(format!(
                            "Skip {} {} price '{}' because {:?}",
                            quote.source, purity, raw_price, why
                        ));
                        stats.skipped += 1;
                        continue;
                    }
                };

                let upsert = self.upsert(RecordKey::of(quote.source, date, *purity), price, stamp);
                stats.count(upsert);
            }
        }

        stats
    }

    /// 整份寫回，先寫入暫存檔再改名取代原檔
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create the directory {}", dir.display()))?;
            }
        }

        let json = serde_json::to_string_pretty(&self.records)
            .context("Failed to serialize the ledger records")?;
        let tmp = self.tmp_path();

        let mut file = File::create(&tmp)
            .with_context(|| format!("Failed to create {}", tmp.display()))?;
        file.write_all(json.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .and_then(|_| file.sync_all())
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        drop(file);

        fs::rename(&tmp, &self.path).with_context(|| {
            format!("Failed to rename {} to {}", tmp.display(), self.path.display())
        })
    }

    fn push(&mut self, key: RecordKey, price_per_gm: i64, stamp: &AuditStamp) {
        self.index.insert(key.clone(), self.records.len());
        self.records.push(LedgerRecord::new(key, price_per_gm, stamp));
    }

    fn tmp_path(&self) -> PathBuf {
        sibling_path(&self.path, ".tmp")
    }
}

/// 解析帳本內容，回傳可用的記錄與捨棄的項目數
///
/// 整份不是 JSON 陣列時捨棄數計為 1。
fn parse_records(bytes: &[u8]) -> (Vec<LedgerRecord>, usize) {
    let entries = match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Array(entries)) => entries,
        Ok(other) => {
            logging::warn_file_async(format!(
                "The ledger is not a JSON array but {}",
                json_kind(&other)
            ));
            return (Vec::new(), 1);
        }
        Err(why) => {
            logging::warn_file_async(format!("The ledger is not valid JSON because {}", why));
            return (Vec::new(), 1);
        }
    };

    let mut records = Vec::with_capacity(entries.len());
    let mut dropped = 0;
    for (i, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<LedgerRecord>(entry) {
            Ok(record) => records.push(record),
            Err(why) => {
                logging::warn_file_async(format!("Skip the ledger entry {} because {}", i, why));
                dropped += 1;
            }
        }
    }

    (records, dropped)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// 同目錄下加上後綴的檔名，例︰gold_prices.json => gold_prices.json.tmp
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ledger.json".into());
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};
    use tempfile::TempDir;

    use super::*;
    use crate::{
        crawler::{Extraction, GoldQuote},
        declare::Source,
        util::datetime,
    };

    const ALLOWED: [Purity; 3] = [Purity::K24, Purity::K22, Purity::K18];

    fn stamp(hour: u32) -> AuditStamp {
        let at = datetime::india_offset()
            .with_ymd_and_hms(2024, 2, 4, hour, 0, 0)
            .unwrap();
        AuditStamp::new(at, "gold-bot@users.noreply.github.com")
    }

    fn quote(source: Source, date: Option<NaiveDate>, pairs: &[(&str, &str)]) -> GoldQuote {
        let mut extraction = Extraction::default();
        for (purity, price) in pairs {
            extraction.insert(purity, *price);
        }
        extraction.observed_date = date;
        GoldQuote::from_result(source, Ok(extraction))
    }

    fn jan_first() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 1, 1)
    }

    #[test]
    fn test_upsert_quotes_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(&dir.path().join("gold_prices.json")).unwrap();
        let quotes = vec![quote(Source::Malabar, jan_first(), &[("24K", "13,800"), ("22K", "12650")])];

        let first = ledger.upsert_quotes(&quotes, &ALLOWED, &stamp(10));
        let snapshot = ledger.records().to_vec();
        let second = ledger.upsert_quotes(&quotes, &ALLOWED, &stamp(11));

        assert_eq!(first.inserted, 2);
        assert_eq!(second, UpsertStats { unchanged: 2, ..Default::default() });
        assert!(!second.changed());
        assert_eq!(ledger.records(), snapshot.as_slice());
    }

    #[test]
    fn test_upsert_updates_changed_price() {
        let mut ledger = Ledger::from_records(Path::new("unused.json"), Vec::new());
        let key = RecordKey::new("X", jan_first().unwrap(), "24K");
        ledger.upsert(key.clone(), 1000, &stamp(9));

        let result = ledger.upsert(key.clone(), 1100, &stamp(10));

        assert_eq!(result, Upsert::Updated);
        assert_eq!(ledger.len(), 1);
        let record = ledger.get(&key).unwrap();
        assert_eq!(record.price_per_gm, 1100);
        assert_eq!(record.modified_dt.as_deref(), Some("2024-02-04T10:00:00.000000+05:30"));
        assert_eq!(record.created_dt, "2024-02-04T09:00:00.000000+05:30");
    }

    #[test]
    fn test_upsert_quotes_new_key_and_defaults() {
        let mut ledger = Ledger::from_records(Path::new("unused.json"), Vec::new());
        let quotes = vec![
            quote(Source::Google, None, &[("24K", "7500"), ("14K", "4375")]),
            quote(Source::Grt, None, &[("22K", "Not found")]),
            GoldQuote::failed(Source::Tanishq, crate::crawler::error::ExtractError::NotFound("x".to_string())),
        ];

        let stats = ledger.upsert_quotes(&quotes, &ALLOWED, &stamp(10));

        assert_eq!(stats, UpsertStats { inserted: 1, skipped: 2, ..Default::default() });
        let record = &ledger.records()[0];
        assert_eq!(record.source, "Google");
        assert_eq!(record.date, "2024-02-04");
        assert_eq!(record.purity, "24K");
        assert_eq!(record.price_per_gm, 7500);
        assert_eq!(record.created_by, "gold-bot@users.noreply.github.com");
        assert!(record.modified_dt.is_none());
        assert!(record.modified_by.is_none());
    }

    #[test]
    fn test_duplicate_keys_first_wins() {
        let key = RecordKey::new("X", jan_first().unwrap(), "24K");
        let first = LedgerRecord::new(key.clone(), 1000, &stamp(9));
        let second = LedgerRecord::new(key.clone(), 2000, &stamp(9));
        let mut ledger = Ledger::from_records(Path::new("unused.json"), vec![first, second]);

        assert_eq!(ledger.upsert(key, 1500, &stamp(10)), Upsert::Updated);
        assert_eq!(ledger.records()[0].price_per_gm, 1500);
        assert_eq!(ledger.records()[1].price_per_gm, 2000);
    }

    #[test]
    fn test_insert_if_absent() {
        let mut ledger = Ledger::from_records(Path::new("unused.json"), Vec::new());
        let key = RecordKey::new("X", jan_first().unwrap(), "22K");

        assert!(ledger.insert_if_absent(key.clone(), 9167, &stamp(9)));
        assert!(!ledger.insert_if_absent(key.clone(), 1, &stamp(10)));
        assert_eq!(ledger.get(&key).unwrap().price_per_gm, 9167);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docs").join("data").join("gold_prices.json");
        let mut ledger = Ledger::load(&path).unwrap();
        ledger.upsert(RecordKey::new("X", jan_first().unwrap(), "24K"), 6300, &stamp(9));
        ledger.upsert(RecordKey::new("X", jan_first().unwrap(), "22K"), 5775, &stamp(9));

        ledger.save().unwrap();
        let loaded = Ledger::load(&path).unwrap();

        assert_eq!(loaded.records(), ledger.records());
        assert!(!dir.path().join("docs/data/gold_prices.json.tmp").exists());
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {\n    \"source\": \"X\""));
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gold_prices.json");
        fs::write(&path, "[{\"source\": ").unwrap();

        assert!(Ledger::load(&path).unwrap().is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("gold_prices.json.corrupt")).unwrap(),
            "[{\"source\": "
        );
    }

    #[test]
    fn test_load_invalid_utf8_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gold_prices.json");
        fs::write(&path, [0xff, 0xfe, b'[', b']']).unwrap();

        let mut ledger = Ledger::load(&path).unwrap();
        assert!(ledger.is_empty());
        assert!(dir.path().join("gold_prices.json.corrupt").exists());

        // 之後的寫入照常進行
        ledger.upsert(RecordKey::new("X", jan_first().unwrap(), "24K"), 6300, &stamp(9));
        ledger.save().unwrap();
        assert_eq!(Ledger::load(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_load_not_an_array_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gold_prices.json");
        fs::write(&path, "{}").unwrap();

        assert!(Ledger::load(&path).unwrap().is_empty());
        assert!(dir.path().join("gold_prices.json.corrupt").exists());
    }

    #[test]
    fn test_load_skips_incomplete_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gold_prices.json");
        fs::write(
            &path,
            r#"[
                {"source": "X", "date": "2024-01-01", "purity": "24K", "price_per_gm": 6300,
                 "created_dt": "2024-01-01T10:00:00", "created_by": "legacy",
                 "modified_dt": null, "modified_by": null},
                {"source": "X", "date": "2024-01-01", "purity": "22K"}
            ]"#,
        )
        .unwrap();

        let ledger = Ledger::load(&path).unwrap();

        assert_eq!(ledger.len(), 1);
        let record = &ledger.records()[0];
        assert_eq!(record.price_per_gm, 6300);
        assert_eq!(record.created_dt, "2024-01-01T10:00:00");
        assert!(dir.path().join("gold_prices.json.corrupt").exists());
    }

    #[test]
    fn test_load_valid_file_keeps_no_copy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gold_prices.json");
        fs::write(&path, "[]").unwrap();

        assert!(Ledger::load(&path).unwrap().is_empty());
        assert!(!dir.path().join("gold_prices.json.corrupt").exists());
    }
}
