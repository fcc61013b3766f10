use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// 印度標準時間 (IST) 與 UTC 的時差︰+05:30
const INDIA_OFFSET_SECONDS: i32 = 5 * 60 * 60 + 30 * 60;

/// 回傳 UTC+05:30 的時區
pub fn india_offset() -> FixedOffset {
    FixedOffset::east_opt(INDIA_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// 取得印度當地目前時間
pub fn now_in_india() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&india_offset())
}

/// 取得印度當地今天的日期
pub fn today_in_india() -> NaiveDate {
    now_in_india().date_naive()
}

/// 將英文月份縮寫轉成月份數字，例︰"Feb" => 2，不分大小寫
pub fn month_from_abbr(abbr: &str) -> Option<u32> {
    let month = match abbr.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };

    Some(month)
}

/// 由日、月、年字串組出日期，不存在的日期(例︰31/02)回傳 None
pub fn parse_day_month_year(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        parse_date_part::<i32>(year)?,
        parse_date_part::<u32>(month)?,
        parse_date_part::<u32>(day)?,
    )
}

/// Try to parse a string as a date part and return it as an Option.
fn parse_date_part<T: std::str::FromStr>(date_part_str: &str) -> Option<T> {
    date_part_str.trim().parse::<T>().ok()
}
