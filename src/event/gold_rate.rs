use std::fmt::Write;

use anyhow::Result;

use crate::{
    config,
    crawler::{self, GoldQuote, Summary},
    declare::Purity,
    ledger::{AuditStamp, Ledger},
    logging,
};

/// 報表分隔線的寬度
const BANNER_WIDTH: usize = 50;
const SECTION_WIDTH: usize = 40;

/// 向所有來源抓取金價、輸出報表後寫入帳本
///
/// 個別來源失敗只會出現在報表中，只有帳本無法讀寫時才回傳錯誤。
pub async fn execute(config: &config::App) -> Result<Summary> {
    let sources = crawler::build_sources(&config.crawler);
    if sources.is_empty() {
        logging::warn_file_async("No sources are enabled");
    }

    let quotes = crawler::fetch_all(sources).await;
    let summary = Summary::new(&quotes);
    println!("{}", render_report(&quotes));
    logging::info_file_async(summary.to_string());

    let mut ledger = Ledger::load(&config.ledger.path)?;
    let stamp = AuditStamp::now(&config.ledger.bot_identity);
    let stats = ledger.upsert_quotes(&quotes, &config.ledger.allowed_purities, &stamp);
    ledger.save()?;

    logging::info_file_async(format!(
        "Saved {} records to {} ({})",
        ledger.len(),
        ledger.path().display(),
        stats
    ));

    Ok(summary)
}

/// 產生各來源每克金價的報表，純度依 24K、22K、18K、14K 排列
pub fn render_report(quotes: &[GoldQuote]) -> String {
    let banner = "=".repeat(BANNER_WIDTH);
    let mut report = String::with_capacity(256 * (quotes.len() + 1));

    let _ = writeln!(&mut report, "\n{}", banner);
    let _ = writeln!(&mut report, "GOLD RATES SUMMARY");
    let _ = writeln!(&mut report, "{}", banner);

    for quote in quotes {
        let _ = writeln!(&mut report, "\n{} Gold Rates (per gram):", quote.source);
        let _ = writeln!(&mut report, "{}", "-".repeat(SECTION_WIDTH));

        if quote.success {
            for purity in Purity::iterator() {
                if let Some(price) = quote.rates.get(purity.label()) {
                    let _ = writeln!(&mut report, "  {}: ₹{}", purity, price);
                }
            }
        } else {
            let error = quote.error.as_deref().unwrap_or_default();
            let _ = writeln!(&mut report, "  Error: {}", error);
        }
    }

    let _ = writeln!(&mut report, "\n{}", banner);
    let _ = write!(&mut report, "\n{}", Summary::new(quotes));

    report
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        crawler::{error::ExtractError, Extraction},
        declare::Source,
    };

    fn quotes() -> Vec<GoldQuote> {
        let mut extraction = Extraction::default();
        extraction.insert("18K", "5,625");
        extraction.insert("24K", "7,500");
        extraction.insert("22K", "6,875");

        vec![
            GoldQuote::from_result(Source::Grt, Ok(extraction)),
            GoldQuote::failed(
                Source::Malabar,
                ExtractError::NoRatesFound("No rates found in API response".to_string()),
            ),
        ]
    }

    #[test]
    fn test_render_report() {
        let report = render_report(&quotes());

        assert!(report.starts_with(&format!("\n{}\nGOLD RATES SUMMARY\n", "=".repeat(50))));
        assert!(report.contains(
            "GRT Jewels Gold Rates (per gram):\n----------------------------------------\n  24K: ₹7,500\n  22K: ₹6,875\n  18K: ₹5,625\n"
        ));
        assert!(report.contains(
            "Malabar Gold & Diamonds Gold Rates (per gram):\n----------------------------------------\n  Error: No rates found in API response\n"
        ));
        assert!(report.ends_with("\nSuccessfully fetched rates from 1/2 sources"));
    }

    #[test]
    fn test_render_report_without_sources() {
        let report = render_report(&[]);

        assert!(report.ends_with("Successfully fetched rates from 0/0 sources"));
    }

    #[tokio::test]
    async fn test_execute_without_sources() {
        let dir = TempDir::new().unwrap();
        let mut app = config::App::default();
        app.ledger.path = dir.path().join("data").join("gold_prices.json");
        app.crawler.sources.clear();

        let summary = execute(&app).await.unwrap();

        assert_eq!(summary, Summary::default());
        // 即使沒有報價也會寫回帳本
        assert!(app.ledger.path.exists());
        assert!(Ledger::load(&app.ledger.path).unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_execute() {
        dotenv::dotenv().ok();
        let dir = TempDir::new().unwrap();
        let mut app = config::App::default();
        app.ledger.path = dir.path().join("gold_prices.json");

        match execute(&app).await {
            Ok(summary) => logging::debug_file_async(summary.to_string()),
            Err(why) => logging::debug_file_async(format!("Failed to execute because {:?}", why)),
        }

        logging::flush();
    }
}
