//! 命令列參數，設定檔路徑也可由 `GOLD_CONFIG` 環境變數指定。

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// 印度金價爬蟲
///
/// ```sh
/// # 抓取一次並寫入帳本
/// gold_crawler fetch
///
/// # 由 24K 記錄補齊 22K/18K
/// gold_crawler --config ./app.json backfill
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the JSON config file (defaults to app.json)
    #[arg(short, long, env = "GOLD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// Fetch rates from every enabled source and upsert them into the ledger
    #[default]
    Fetch,
    /// Derive the missing purities from the 24K records in the ledger
    Backfill,
    /// Run fetch on the configured cron expression until interrupted
    Schedule,
}

impl Cli {
    /// 沒有指定子命令時執行 fetch
    pub fn command(&self) -> Command {
        self.command.unwrap_or_default()
    }
}
