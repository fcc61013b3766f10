//! # Tanishq 金價採集模組
//!
//! 金價以 data-* 屬性的形式放在 `.goldpurity-rate` 元素上，
//! 頁面第一個符合的元素即為當天的價格。
//!
//! ## 站點資訊
//!
//! - 來源域名：`www.tanishq.co.in`
//! - 抓取技術：先造訪首頁取得 cookie，再以同站來源請求金價頁面。
//! - 網站會擋一般的 HTTP 用戶端，預設不啟用。

/// 金價頁面解析
pub mod rate;

const HOST: &str = "www.tanishq.co.in";

pub struct Tanishq {}
