use std::{
    env,
    fmt::Debug,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use config::{Config as config_config, File as config_file};
use serde::{Deserialize, Serialize};

use crate::{
    declare::{Purity, Source},
    logging,
};

const CONFIG_PATH: &str = "app.json";

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct App {
    pub ledger: Ledger,
    pub backfill: Backfill,
    pub crawler: Crawler,
    pub scheduler: Scheduler,
}

const GOLD_LEDGER_PATH: &str = "GOLD_LEDGER_PATH";
const GOLD_BOT_IDENTITY: &str = "GOLD_BOT_IDENTITY";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Ledger {
    /// 帳本 JSON 檔的路徑
    pub path: PathBuf,
    /// 寫入 created_by / modified_by 的身分
    pub bot_identity: String,
    /// 允許寫入帳本的純度
    pub allowed_purities: Vec<Purity>,
}

impl Default for Ledger {
    fn default() -> Self {
        Ledger {
            path: PathBuf::from("docs/data/gold_prices.json"),
            bot_identity: "gold-bot@users.noreply.github.com".to_string(),
            allowed_purities: vec![Purity::K24, Purity::K22, Purity::K18],
        }
    }
}

const GOLD_BACKFILL_PURITIES: &str = "GOLD_BACKFILL_PURITIES";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Backfill {
    /// 由 24K 推算補齊的純度，14K 需自行加入
    pub derived_purities: Vec<Purity>,
}

impl Default for Backfill {
    fn default() -> Self {
        Backfill {
            derived_purities: vec![Purity::K22, Purity::K18],
        }
    }
}

const GOLD_SOURCES: &str = "GOLD_SOURCES";
const GOLD_TEN_GRAM_THRESHOLD: &str = "GOLD_TEN_GRAM_THRESHOLD";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Crawler {
    /// 要抓取的來源，Tanishq 會擋一般的 HTTP 用戶端，預設不啟用
    pub sources: Vec<Source>,
    /// Google 報價高於此值時視為 10 克的價格
    pub ten_gram_threshold: i64,
    /// Malabar getrates API 的州別
    pub malabar_state: String,
}

impl Default for Crawler {
    fn default() -> Self {
        Crawler {
            sources: vec![Source::Malabar, Source::Grt, Source::Google],
            ten_gram_threshold: 50_000,
            malabar_state: "Karnataka".to_string(),
        }
    }
}

const GOLD_CRON: &str = "GOLD_CRON";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Scheduler {
    /// 含秒的 cron 表示式(UTC)，預設為印度時間每天 10:00
    pub cron: String,
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler {
            cron: "0 30 4 * * *".to_string(),
        }
    }
}

impl App {
    /// 讀取設定檔後再以環境變數覆蓋
    ///
    /// 沒有指定路徑時使用 `app.json`，檔案不存在時使用預設值。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
        let app = if path.exists() {
            config_config::builder()
                .add_source(config_file::from(path.as_path()))
                .build()
                .and_then(|c| c.try_deserialize::<App>())
                .with_context(|| format!("Failed to load the config {}", path.display()))?
        } else {
            logging::info_file_async(format!(
                "The config {} does not exist, using defaults",
                path.display()
            ));
            App::default()
        };

        Ok(app.override_with_env())
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(self) -> Self {
        self.override_with(|key| env::var(key).ok())
    }

    fn override_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(GOLD_LEDGER_PATH) {
            self.ledger.path = PathBuf::from(path);
        }

        if let Some(identity) = lookup(GOLD_BOT_IDENTITY) {
            self.ledger.bot_identity = identity;
        }

        if let Some(purities) = lookup(GOLD_BACKFILL_PURITIES) {
            self.backfill.derived_purities = parse_list(GOLD_BACKFILL_PURITIES, &purities);
        }

        if let Some(sources) = lookup(GOLD_SOURCES) {
            self.crawler.sources = parse_list(GOLD_SOURCES, &sources);
        }

        if let Some(threshold) = lookup(GOLD_TEN_GRAM_THRESHOLD) {
            match threshold.trim().parse::<i64>() {
                Ok(v) => self.crawler.ten_gram_threshold = v,
                Err(why) => logging::error_file_async(format!(
                    "Failed to parse {}={} because {:?}",
                    GOLD_TEN_GRAM_THRESHOLD, threshold, why
                )),
            }
        }

        if let Some(cron) = lookup(GOLD_CRON) {
            self.scheduler.cron = cron;
        }

        self
    }
}

/// 解析以逗號分隔的清單，無法辨識的項目寫入日誌後略過
fn parse_list<T>(name: &str, raw: &str) -> Vec<T>
where
    T: FromStr,
    T::Err: Debug,
{
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .filter_map(|item| match T::from_str(item) {
            Ok(v) => Some(v),
            Err(why) => {
                logging::error_file_async(format!(
                    "Skip the unknown item '{}' of {} because {:?}",
                    item, name, why
                ));
                None
            }
        })
        .collect()
}

/// 回傳設定檔的路徑
fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}
