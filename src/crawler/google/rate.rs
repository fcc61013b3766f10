use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use scraper::Html;

use crate::{
    calculation::karat_ratio,
    crawler::{
        error::ExtractError,
        google::{snippet, Google, HOST},
        share, Extraction, GoldRateSource,
    },
    declare::{Purity, Source},
    logging,
    util::{self, datetime, http::element},
};

/// 依序嘗試的 User-Agent，被擋下時換下一個
const USER_AGENT_PROFILES: [&str; 3] = [
    "Mozilla/5.0 (Linux; Android 12; Pixel 6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
];

/// 由 24K 推算的純度
const DERIVED_PURITIES: [Purity; 2] = [Purity::K22, Purity::K18];

const CARD_LABEL: &str = "24k gold";

#[async_trait]
impl GoldRateSource for Google {
    fn source(&self) -> Source {
        Source::Google
    }

    async fn fetch_rates(&self) -> Result<Extraction, ExtractError> {
        let url = format!(
            "https://{host}/search?q=gold+price+india+bangalore&hl=en&gl=IN",
            host = HOST
        );
        let mut last_error = None;

        for (i, user_agent) in USER_AGENT_PROFILES.into_iter().enumerate() {
            if i > 0 {
                share::random_pause(1000..2500).await;
            }

            let headers = util::http::headers(&[
                ("User-Agent", user_agent),
                ("Accept", share::HTML_ACCEPT),
                ("Accept-Language", "en-IN,en;q=0.9"),
            ]);

            let result = match util::http::get(&url, Some(headers)).await {
                Ok(html) => parse(&html, self.ten_gram_threshold, datetime::today_in_india()),
                Err(why) => Err(why.into()),
            };

            match result {
                Ok(extraction) => return Ok(extraction),
                Err(why) => {
                    logging::warn_file_async(format!(
                        "Google profile {} failed because {}",
                        i, why
                    ));
                    last_error = Some(why);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ExtractError::ParseFailure("Could not fetch Google results".to_string())
        }))
    }
}

/// 解析搜尋結果頁面
///
/// 先試包含 `24k gold` 的元素文字，最後才是整個 `body`；
/// 24K 以報價除以克數取整數，22K、18K 由 24K 依比例推算。
pub fn parse(
    html: &str,
    ten_gram_threshold: Decimal,
    today: NaiveDate,
) -> Result<Extraction, ExtractError> {
    let lower = html.to_lowercase();
    if lower.contains("unusual traffic") || lower.contains("recaptcha") {
        return Err(ExtractError::Blocked(Source::Google.name()));
    }

    let document = Html::parse_document(html);
    let body = element::body_text(&document);
    let mut candidates = element::texts_containing(&document, CARD_LABEL);
    candidates.push(body.clone());

    let (price, gram_basis) = candidates
        .iter()
        .find_map(|text| snippet::find_price(text, ten_gram_threshold))
        .ok_or_else(|| {
            ExtractError::ParseFailure("Could not parse price from Google card".to_string())
        })?;

    let price_24k = karat_ratio::per_gram(price, gram_basis);
    let mut extraction = Extraction::default();
    extraction.insert(Purity::K24.label(), price_24k.to_string());
    for (purity, price) in karat_ratio::derive_all(price_24k, &DERIVED_PURITIES) {
        extraction.insert(purity.label(), price.to_string());
    }

    extraction.observed_date = snippet::parse_observed_date(&body, today);

    Ok(extraction)
}
