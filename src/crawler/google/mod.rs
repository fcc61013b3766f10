//! # Google 金價卡片採集模組
//!
//! 以「gold price india bangalore」搜尋，從結果頁的金價卡片文字中找出 24K 的價格。
//! 卡片只是一段自由文字，解析策略見 [`snippet`]。
//!
//! ## 站點資訊
//!
//! - 來源域名：`www.google.com`
//! - 抓取技術：輪流使用不同的 User-Agent，遇到驗證碼頁面就換下一個。

use rust_decimal::Decimal;

/// 搜尋結果頁面的抓取與整理
pub mod rate;
/// 金價卡片文字的解析策略
pub mod snippet;

const HOST: &str = "www.google.com";

pub struct Google {
    /// 報價高於此值視為 10 克的價格，否則為 1 克
    ten_gram_threshold: Decimal,
}

impl Google {
    pub fn new(ten_gram_threshold: Decimal) -> Self {
        Google { ten_gram_threshold }
    }
}
