use async_trait::async_trait;
use scraper::Html;

use crate::{
    crawler::{
        error::ExtractError,
        share,
        tanishq::{Tanishq, HOST},
        Extraction, GoldRateSource,
    },
    declare::Source,
    util::{self, http::element},
};

/// 金價元素的屬性名稱與對應的純度
const RATE_ATTRIBUTES: [(&str, &str); 3] = [
    ("data-goldrate22kt", "22K"),
    ("data-goldrate24kt", "24K"),
    ("data-goldrate18kt", "18K"),
];

#[async_trait]
impl GoldRateSource for Tanishq {
    fn source(&self) -> Source {
        Source::Tanishq
    }

    async fn fetch_rates(&self) -> Result<Extraction, ExtractError> {
        let home = format!("https://{host}/", host = HOST);
        let url = format!("https://{host}/gold-rate.html?lang=en_IN", host = HOST);

        share::random_pause(1000..3000).await;
        // 首頁的回應只用來取得 cookie
        util::http::get(&home, Some(navigate_headers("https://www.google.com/", "cross-site"))).await?;

        share::random_pause(1000..2000).await;
        let text = util::http::get(&url, Some(navigate_headers(&home, "same-origin"))).await?;

        parse(&text)
    }
}

fn navigate_headers(referer: &str, fetch_site: &str) -> reqwest::header::HeaderMap {
    util::http::headers(&[
        ("Accept", share::HTML_ACCEPT),
        ("Accept-Language", "en-US,en;q=0.9"),
        ("Referer", referer),
        ("DNT", "1"),
        ("Upgrade-Insecure-Requests", "1"),
        ("Sec-Fetch-Dest", "document"),
        ("Sec-Fetch-Mode", "navigate"),
        ("Sec-Fetch-Site", fetch_site),
        ("Sec-Fetch-User", "?1"),
    ])
}

/// 解析金價頁面
///
/// 缺少的屬性不列入結果，日期取頁面中第一個合法的 `DD-MM-YYYY`。
pub fn parse(html: &str) -> Result<Extraction, ExtractError> {
    let document = Html::parse_document(html);
    let rate = element::select_first(&document, ".goldpurity-rate")
        .map_err(|why| ExtractError::Unexpected(why.to_string()))?
        .ok_or_else(|| ExtractError::NotFound("Could not find gold rate element on page".to_string()))?;

    let mut extraction = Extraction::default();
    for (name, purity) in RATE_ATTRIBUTES {
        if let Some(price) = element::attr(&rate, name) {
            extraction.insert(purity, price);
        }
    }

    if extraction.rates.is_empty() {
        return Err(ExtractError::NoRatesFound(
            "The gold rate element has no rate attributes".to_string(),
        ));
    }

    extraction.observed_date = share::first_day_month_year(html, '-');

    Ok(extraction)
}
