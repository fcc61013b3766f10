use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};

pub mod backfill;
pub mod calculation;
pub mod cli;
pub mod config;
pub mod crawler;
pub mod declare;
pub mod event;
pub mod ledger;
pub mod logging;
pub mod scheduler;
pub mod util;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    let code = match run(&cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(why) => {
            logging::error_console(format!("{:?}", why));
            logging::error_file_async(format!("Failed to run {:?} because {:?}", cli.command(), why));
            ExitCode::FAILURE
        }
    };

    logging::flush();
    util::http::flush_log();

    code
}

async fn run(cli: &Cli) -> Result<()> {
    let app = config::App::load(cli.config.as_deref())?;

    match cli.command() {
        Command::Fetch => {
            // 個別來源失敗不影響結束代碼
            event::gold_rate::execute(&app).await?;
        }
        Command::Backfill => {
            let added = backfill::derived_purity::execute(&app)?;
            if added > 0 {
                println!("Backfilled {} entries.", added);
            } else {
                println!("No missing entries found to backfill.");
            }
        }
        Command::Schedule => scheduler::start(app).await?,
    }

    Ok(())
}
