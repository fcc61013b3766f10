use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::{
    declare::{Purity, Source},
    util::{datetime, map::Keyable},
};

/// 帳本中的一筆金價
///
/// 欄位順序即為 JSON 輸出的順序，`modified_*` 在價格第一次變動前為 null。
/// 時間欄位保留原本的字串，舊資料的格式不會被改寫。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LedgerRecord {
    pub source: String,
    /// ISO-8601 日期，例︰2024-02-04
    pub date: String,
    pub purity: String,
    pub price_per_gm: i64,
    #[serde(default)]
    pub created_dt: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub modified_dt: Option<String>,
    #[serde(default)]
    pub modified_by: Option<String>,
}

impl LedgerRecord {
    pub fn new(key: RecordKey, price_per_gm: i64, stamp: &AuditStamp) -> Self {
        LedgerRecord {
            source: key.source,
            date: key.date,
            purity: key.purity,
            price_per_gm,
            created_dt: stamp.timestamp(),
            created_by: stamp.by.clone(),
            modified_dt: None,
            modified_by: None,
        }
    }

    /// 價格不同時才更新並蓋上修改戳記，回傳是否有變動
    pub fn set_price(&mut self, price_per_gm: i64, stamp: &AuditStamp) -> bool {
        if self.price_per_gm == price_per_gm {
            return false;
        }

        self.price_per_gm = price_per_gm;
        self.modified_dt = Some(stamp.timestamp());
        self.modified_by = Some(stamp.by.clone());

        true
    }
}

/// 帳本的自然鍵 (source, date, purity)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub source: String,
    pub date: String,
    pub purity: String,
}

impl RecordKey {
    pub fn new(source: &str, date: NaiveDate, purity: &str) -> Self {
        RecordKey {
            source: source.to_string(),
            date: date.to_string(),
            purity: purity.to_string(),
        }
    }

    pub fn of(source: Source, date: NaiveDate, purity: Purity) -> Self {
        Self::new(&source.name(), date, purity.label())
    }

    /// 同一來源、同一天的另一個純度
    pub fn with_purity(&self, purity: Purity) -> Self {
        RecordKey {
            source: self.source.clone(),
            date: self.date.clone(),
            purity: purity.label().to_string(),
        }
    }
}

impl Keyable for LedgerRecord {
    type Key = RecordKey;

    fn key(&self) -> RecordKey {
        RecordKey {
            source: self.source.clone(),
            date: self.date.clone(),
            purity: self.purity.clone(),
        }
    }
}

/// 寫入帳本時的稽核戳記(時間 + 機器人身分)
#[derive(Debug, Clone, PartialEq)]
pub struct AuditStamp {
    pub at: DateTime<FixedOffset>,
    pub by: String,
}

impl AuditStamp {
    pub fn new(at: DateTime<FixedOffset>, by: &str) -> Self {
        AuditStamp {
            at,
            by: by.to_string(),
        }
    }

    /// 以印度當地的目前時間建立戳記
    pub fn now(by: &str) -> Self {
        Self::new(datetime::now_in_india(), by)
    }

    /// RFC 3339 並保留微秒，例︰2024-02-04T10:00:00.123456+05:30
    pub fn timestamp(&self) -> String {
        self.at.to_rfc3339_opts(SecondsFormat::Micros, false)
    }

    /// 戳記當地的日期，報價沒有日期時使用
    pub fn today(&self) -> NaiveDate {
        self.at.date_naive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn stamp() -> AuditStamp {
        let at = datetime::india_offset()
            .with_ymd_and_hms(2024, 2, 4, 23, 30, 0)
            .unwrap();
        AuditStamp::new(at, "gold-bot@users.noreply.github.com")
    }

    #[test]
    fn test_audit_stamp() {
        let stamp = stamp();

        assert_eq!(stamp.timestamp(), "2024-02-04T23:30:00.000000+05:30");
        assert_eq!(stamp.today(), NaiveDate::from_ymd_opt(2024, 2, 4).unwrap());
    }

    #[test]
    fn test_set_price() {
        let key = RecordKey::of(
            Source::Grt,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Purity::K24,
        );
        let mut record = LedgerRecord::new(key.clone(), 1000, &stamp());

        assert_eq!(record.key(), key);
        assert_eq!(record.source, "GRT Jewels");
        assert!(record.modified_dt.is_none());
        assert!(!record.set_price(1000, &stamp()));
        assert!(record.modified_dt.is_none());
        assert!(record.set_price(1100, &stamp()));
        assert_eq!(record.price_per_gm, 1100);
        assert_eq!(record.modified_by.as_deref(), Some("gold-bot@users.noreply.github.com"));
    }

    #[test]
    fn test_serialize_field_order() {
        let key = RecordKey::new("Google", NaiveDate::from_ymd_opt(2024, 2, 4).unwrap(), "22K");
        let json = serde_json::to_string(&LedgerRecord::new(key, 6875, &stamp())).unwrap();

        assert_eq!(
            json,
            r#"{"source":"Google","date":"2024-02-04","purity":"22K","price_per_gm":6875,"created_dt":"2024-02-04T23:30:00.000000+05:30","created_by":"gold-bot@users.noreply.github.com","modified_dt":null,"modified_by":null}"#
        );
    }

    #[test]
    fn test_deserialize_legacy_record() {
        let json = r#"{"source":"GRT Jewels","date":"2024-01-01","purity":"24K","price_per_gm":6300,"created_dt":"2024-01-01T09:00:00.123456"}"#;
        let record: LedgerRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.created_dt, "2024-01-01T09:00:00.123456");
        assert_eq!(record.created_by, "");
        assert!(record.modified_by.is_none());
    }
}
