//! # GRT Jewels 金價採集模組
//!
//! 首頁 HTML 內嵌一段跳脫過的 JSON(`\"gold_rate\":[...]`)，
//! 其中 `type == "GOLD"` 且 `unit == "G"` 的項目即為每克金價。

/// 首頁內嵌 JSON 解析
pub mod rate;

const HOST: &str = "www.grtjewels.com";

pub struct Grt {}
