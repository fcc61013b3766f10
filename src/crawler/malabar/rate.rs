use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::{
    crawler::{
        error::ExtractError,
        malabar::{Malabar, HOST},
        share, Extraction, GoldRateSource,
    },
    declare::{Purity, Source},
    logging,
    util::{self, text},
};

/// 面板表格的一列，例︰`22 KT(916) - </td><td>₹  12650/g`
static REG_PANEL_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*KT\([^)]*\)\s*-\s*</td>\s*<td[^>]*>[^0-9]*([0-9][0-9,]*)(?:\.\d+)?\s*/g")
        .expect("Failed to compile panel row regex")
});

/// getrates API 的欄位與對應的純度
const RATE_FIELDS: [(&str, Purity); 2] = [("24kt", Purity::K24), ("22kt", Purity::K22)];

#[async_trait]
impl GoldRateSource for Malabar {
    fn source(&self) -> Source {
        Source::Malabar
    }

    async fn fetch_rates(&self) -> Result<Extraction, ExtractError> {
        let home = format!("https://{host}/", host = HOST);
        let panel_url = format!(
            "https://{host}/malabarprice/index/currentGoldRate/",
            host = HOST
        );
        let rates_url = format!(
            "https://{host}/malabarprice/index/getrates/?country=IN&state={state}",
            host = HOST,
            state = self.state
        );
        let headers = util::http::headers(&[
            ("Accept", "application/json"),
            ("X-Requested-With", "XMLHttpRequest"),
            ("Referer", home.as_str()),
        ]);

        // 首頁只用來取得 cookie，失敗也繼續
        if let Err(why) = util::http::get(&home, Some(headers.clone())).await {
            logging::warn_file_async(format!("Failed to visit {} because {:?}", home, why));
        }

        let panel = util::http::get(&panel_url, Some(headers.clone())).await;
        let rates = util::http::get(&rates_url, Some(headers)).await;

        match (panel, rates) {
            (Err(panel_err), Err(_)) => Err(panel_err.into()),
            (panel, rates) => {
                let panel = log_failure(&panel_url, panel);
                let rates = log_failure(&rates_url, rates);
                parse(panel.as_deref(), rates.as_deref())
            }
        }
    }
}

fn log_failure(url: &str, result: anyhow::Result<String>) -> Option<String> {
    match result {
        Ok(text) => Some(text),
        Err(why) => {
            logging::warn_file_async(format!("Failed to get {} because {:?}", url, why));
            None
        }
    }
}

/// 合併兩支 API 的結果，任一個 payload 都可能不存在
///
/// 兩者都沒有價格時，若有 payload 不是合法 JSON 回傳 `MalformedPayload`，
/// 否則回傳 `NoRatesFound`。
pub fn parse(panel: Option<&str>, rates: Option<&str>) -> Result<Extraction, ExtractError> {
    let mut extraction = Extraction::default();
    let mut malformed = None;

    if let Some(panel) = panel {
        match serde_json::from_str::<Value>(panel) {
            Ok(json) => parse_panel(&json, &mut extraction),
            Err(why) => malformed = Some(why.to_string()),
        }
    }

    if let Some(rates) = rates {
        match serde_json::from_str::<Value>(rates) {
            Ok(json) => parse_rates(&json, &mut extraction),
            Err(why) => malformed = malformed.or(Some(why.to_string())),
        }
    }

    if extraction.rates.is_empty() {
        return Err(match malformed {
            Some(why) => ExtractError::MalformedPayload(why),
            None => ExtractError::NoRatesFound("No rates found in API response".to_string()),
        });
    }

    Ok(extraction)
}

/// 解析 `data` 欄位中的 HTML 表格，例︰"22 KT(916)" => "22K"
///
/// 不認得的 K 數(例如 9 KT)略過。
fn parse_panel(json: &Value, extraction: &mut Extraction) {
    let Some(html) = json.get("data").and_then(Value::as_str) else {
        return;
    };

    for caps in REG_PANEL_ROW.captures_iter(html) {
        let purity = caps[1].parse::<u32>().ok().and_then(Purity::from_karat);
        if let Some(purity) = purity {
            extraction.insert(purity.label(), caps[2].replace(',', ""));
        }
    }
}

/// 只補面板沒有的純度，日期取自 `updated_time`(DD/MM/YYYY)
fn parse_rates(json: &Value, extraction: &mut Extraction) {
    for (field, purity) in RATE_FIELDS {
        if extraction.contains(purity) {
            continue;
        }

        let amount = match json.get(field) {
            Some(Value::String(s)) => text::truncate_amount(s),
            Some(Value::Number(n)) => text::truncate_amount(&n.to_string()),
            _ => None,
        };

        if let Some(amount) = amount {
            extraction.insert(purity.label(), amount);
        }
    }

    if let Some(updated_time) = json.get("updated_time").and_then(Value::as_str) {
        extraction.observed_date = share::first_day_month_year(updated_time, '/');
    }
}
