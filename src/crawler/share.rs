use std::{ops::Range, time::Duration};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use crate::util::datetime;

/// 瀏覽器開啟一般網頁時的 Accept
pub(super) const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";

static REG_DAY_MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2})([-/])(\d{2})([-/])(\d{4})").expect("Failed to compile date regex")
});

/// 在兩次請求之間隨機等待一段時間(毫秒)
pub(super) async fn random_pause(range_ms: Range<u64>) {
    let ms = rand::rng().random_range(range_ms);
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// 找出文字中第一個合法的 `DD{sep}MM{sep}YYYY` 日期
///
/// 像 `31-02-2024` 這種不存在的日期會被略過並繼續往後找。
pub(super) fn first_day_month_year(text: &str, sep: char) -> Option<NaiveDate> {
    REG_DAY_MONTH_YEAR.captures_iter(text).find_map(|caps| {
        let same_sep = caps[2].starts_with(sep) && caps[4].starts_with(sep);
        if !same_sep {
            return None;
        }

        datetime::parse_day_month_year(&caps[1], &caps[3], &caps[5])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_day_month_year() {
        assert_eq!(
            first_day_month_year("Rates as on 04-02-2024 10:00", '-'),
            NaiveDate::from_ymd_opt(2024, 2, 4)
        );
        assert_eq!(
            first_day_month_year("31-02-2024 then 05-02-2024", '-'),
            NaiveDate::from_ymd_opt(2024, 2, 5)
        );
        assert_eq!(
            first_day_month_year("04/02/2024 11:30 AM", '/'),
            NaiveDate::from_ymd_opt(2024, 2, 4)
        );
        assert_eq!(first_day_month_year("04/02/2024", '-'), None);
        assert_eq!(first_day_month_year("04-02/2024", '-'), None);
        assert_eq!(first_day_month_year("no date", '-'), None);
    }
}
