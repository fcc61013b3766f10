use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::{
    crawler::{
        error::ExtractError,
        grt::{Grt, HOST},
        share, Extraction, GoldRateSource,
    },
    declare::Source,
    util,
};

/// 內嵌 JSON 的鍵，引號前可能有一或多個反斜線
static REG_GOLD_RATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\\+"gold_rate\\+"\s*:\s*(\[.*?\])"#).expect("Failed to compile gold_rate regex")
});

static REG_ESCAPED_QUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\\+""#).expect("Failed to compile escaped quote regex"));

#[async_trait]
impl GoldRateSource for Grt {
    fn source(&self) -> Source {
        Source::Grt
    }

    async fn fetch_rates(&self) -> Result<Extraction, ExtractError> {
        let url = format!("https://{host}/", host = HOST);
        let headers = util::http::headers(&[("Accept", share::HTML_ACCEPT)]);
        let text = util::http::get(&url, Some(headers)).await?;

        parse(&text)
    }
}

/// 解析首頁 HTML 中的 `gold_rate` 陣列
pub fn parse(html: &str) -> Result<Extraction, ExtractError> {
    let fragment = REG_GOLD_RATE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ExtractError::NotFound("Could not find gold_rate JSON in HTML".to_string()))?
        .as_str();
    let cleaned = REG_ESCAPED_QUOTE.replace_all(fragment, "\"");
    let gold_rates: Vec<Value> = serde_json::from_str(&cleaned)
        .map_err(|why| ExtractError::MalformedPayload(why.to_string()))?;

    let mut extraction = Extraction::default();
    for rate in &gold_rates {
        if rate.get("type").and_then(Value::as_str) != Some("GOLD")
            || rate.get("unit").and_then(Value::as_str) != Some("G")
        {
            continue;
        }

        let purity = rate.get("purity").and_then(Value::as_str).map(str::trim);
        let amount = rate.get("amount").and_then(amount_text);
        if let (Some(purity), Some(amount)) = (purity, amount) {
            if purity.is_empty() {
                continue;
            }

            // "22 KT" => "22K"
            extraction.insert(purity.replace(" KT", "K").trim(), amount);
        }
    }

    if extraction.rates.is_empty() {
        return Err(ExtractError::NoRatesFound(
            "No gold rates found in parsed JSON".to_string(),
        ));
    }

    Ok(extraction)
}

/// 金額以 JSON 數值或字串表示，0 與空字串視為沒有金額
fn amount_text(amount: &Value) -> Option<String> {
    match amount {
        Value::Number(n) if n.as_f64().is_some_and(|v| v != 0.0) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}
