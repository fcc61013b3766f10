use std::{collections::HashSet, str::FromStr};

use anyhow::*;
use rust_decimal::Decimal;

const NUMBER_ESCAPE_CHAR: &[char] = &[',', ' ', '"', '\n', '\r', '\t'];

/// Parses a decimal value from a given string.
///
/// Thousands separators and the characters in `escape_chars` are removed
/// before parsing.
///
/// # Example
///
/// ```
/// let s = "1,234.56";
/// let decimal_value = parse_decimal(s, None).unwrap();
/// ```
pub fn parse_decimal(s: &str, escape_chars: Option<Vec<char>>) -> Result<Decimal> {
    let cleaned = clean_escape_chars(s, escape_chars);
    Decimal::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as Decimal because {:?}", cleaned, why))
}

/// Parses an `i64` value from a given string.
///
/// # Example
///
/// ```
/// let s = "1,234";
/// let i64_value = parse_i64(s, None).unwrap();
/// ```
pub fn parse_i64(s: &str, escape_chars: Option<Vec<char>>) -> Result<i64> {
    let cleaned = clean_escape_chars(s, escape_chars);
    i64::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as i64 because: {:?}", cleaned, why))
}

/// 將來源網站給的價格字串轉成整數的每克價格
///
/// 移除千分位後捨去小數部份，例︰"12,345.67" => 12345。
/// 非數字內容(例︰"Not found")回傳錯誤，由呼叫端決定是否略過。
pub fn parse_price_per_gram(s: &str) -> Result<i64> {
    let cleaned = clean_escape_chars(s, None);
    let integer_part = cleaned.split('.').next().unwrap_or_default();
    if integer_part.is_empty() {
        bail!("The price '{}' has no integer part", s);
    }

    parse_i64(integer_part, None)
}

/// 取出 "13,800.00 INR" 這類字串的整數部份，例︰"13800"
///
/// 只做字串處理，不保證結果為數字。
pub fn truncate_amount(s: &str) -> Option<String> {
    let amount = s.split_whitespace().next()?.replace(',', "");
    let integer_part = amount.split('.').next()?.trim();

    if integer_part.is_empty() {
        return None;
    }

    Some(integer_part.to_string())
}

/// 將連續的空白字元(含換行)壓縮成單一空白
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes a set of escape characters from a given string.
///
/// # Example
///
/// ```
/// let s = "12,345 ";
/// let clean_s = clean_escape_chars(s, None);
/// assert_eq!(clean_s, "12345");
/// ```
pub(crate) fn clean_escape_chars(s: &str, escape_chars: Option<Vec<char>>) -> String {
    let mut combined: Vec<char> = NUMBER_ESCAPE_CHAR.to_vec();
    if let Some(ec) = escape_chars {
        combined.extend(ec);
    }

    let filters = combined.iter().collect::<HashSet<_>>();
    s.chars().filter(|c| !filters.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    // 注意這個慣用法：在 tests 模組中，從外部範疇匯入所有名字。
    use super::*;

    #[test]
    fn test_parse_price_per_gram() {
        assert_eq!(parse_price_per_gram("12,345.00").unwrap(), 12345);
        assert_eq!(parse_price_per_gram("6800").unwrap(), 6800);
        assert_eq!(parse_price_per_gram(" 7,512 ").unwrap(), 7512);
        assert_eq!(parse_price_per_gram("6800.99").unwrap(), 6800);
        assert!(parse_price_per_gram("Not found").is_err());
        assert!(parse_price_per_gram("").is_err());
        assert!(parse_price_per_gram(".50").is_err());
        assert!(parse_price_per_gram("₹ 6800").is_err());
    }

    #[test]
    fn test_truncate_amount() {
        assert_eq!(truncate_amount("13,800.00 INR"), Some("13800".to_string()));
        assert_eq!(truncate_amount("12650"), Some("12650".to_string()));
        assert_eq!(truncate_amount("   "), None);
        assert_eq!(truncate_amount(".00 INR"), None);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("75,000", None).unwrap(), dec!(75000));
        assert_eq!(parse_decimal("7,512.40", None).unwrap(), dec!(7512.40));
        assert!(parse_decimal("abc", None).is_err());
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  10g of\n24k   gold\tin Bengaluru "),
            "10g of 24k gold in Bengaluru"
        );
    }

    #[test]
    fn test_clean_escape_chars() {
        let result = clean_escape_chars("\"1,234\" ₹", Some(vec!['₹']));
        assert_eq!(result, "1234");
    }
}
