use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::util::{datetime, text};

/// 由卡片文字找出 (報價, 報價的克數)
pub type Strategy = fn(&str, Decimal) -> Option<(Decimal, u32)>;

/// 依序嘗試的解析策略，第一個有結果的為準
pub const STRATEGIES: [(&str, Strategy); 4] = [
    ("anchored 10g", anchored_ten_gram),
    ("anchored 1g", anchored_one_gram),
    ("24k gold window", window_after_label),
    ("first amount", first_amount),
];

/// `24k gold` 之後要搜尋的字元數
const WINDOW_CHARS: usize = 300;

static REG_TEN_GRAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)10g of 24k gold.*?(?:Bengaluru|Bangalore).*?([0-9][0-9,]*(?:\.\d+)?)\s*Indian Rupee")
        .expect("Failed to compile 10g regex")
});

static REG_ONE_GRAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b1g of 24k gold.*?(?:Bengaluru|Bangalore).*?([0-9][0-9,]*(?:\.\d+)?)\s*Indian Rupee")
        .expect("Failed to compile 1g regex")
});

static REG_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([0-9][0-9,]*(?:\.\d+)?)\s*Indian Rupee").expect("Failed to compile amount regex")
});

static REG_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)24k gold").expect("Failed to compile label regex"));

static REG_DAY_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{1,2})\s*(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)")
        .expect("Failed to compile day month regex")
});

/// 壓縮空白後依序套用所有策略
pub fn find_price(text: &str, ten_gram_threshold: Decimal) -> Option<(Decimal, u32)> {
    let normalized = text::normalize_whitespace(text);

    STRATEGIES
        .iter()
        .find_map(|(_, strategy)| strategy(&normalized, ten_gram_threshold))
}

/// `10g of 24k gold … Bengaluru … 75,000 Indian Rupee`
pub fn anchored_ten_gram(text: &str, _: Decimal) -> Option<(Decimal, u32)> {
    capture_amount(&REG_TEN_GRAM, text).map(|v| (v, 10))
}

/// `1g of 24k gold … Bangalore … 7,500 Indian Rupee`
pub fn anchored_one_gram(text: &str, _: Decimal) -> Option<(Decimal, u32)> {
    capture_amount(&REG_ONE_GRAM, text).map(|v| (v, 1))
}

/// 第一個 `24k gold` 之後 300 個字元內的第一個金額，克數依大小判斷
pub fn window_after_label(text: &str, ten_gram_threshold: Decimal) -> Option<(Decimal, u32)> {
    let start = REG_LABEL.find(text)?.start();
    let window: String = text[start..].chars().take(WINDOW_CHARS).collect();

    capture_amount(&REG_AMOUNT, &window).map(|v| (v, gram_basis(v, ten_gram_threshold)))
}

/// 整段文字中的第一個金額，克數依大小判斷
pub fn first_amount(text: &str, ten_gram_threshold: Decimal) -> Option<(Decimal, u32)> {
    capture_amount(&REG_AMOUNT, text).map(|v| (v, gram_basis(v, ten_gram_threshold)))
}

/// 高於門檻的金額視為 10 克的價格
pub fn gram_basis(value: Decimal, ten_gram_threshold: Decimal) -> u32 {
    if value > ten_gram_threshold {
        10
    } else {
        1
    }
}

/// 卡片上的日期(例︰"4 Feb, 4:12 pm IST")只有日與月，年份取 `today`
///
/// 只看第一個符合的日期，不存在的日期回傳 None。
pub fn parse_observed_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = REG_DAY_MONTH.captures(text)?;
    let day = caps[1].parse::<u32>().ok()?;
    let month = datetime::month_from_abbr(&caps[2])?;

    NaiveDate::from_ymd_opt(today.year(), month, day)
}

fn capture_amount(re: &Regex, text: &str) -> Option<Decimal> {
    let caps = re.captures(text)?;
    text::parse_decimal(&caps[1], None).ok()
}
