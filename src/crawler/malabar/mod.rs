//! # Malabar Gold & Diamonds 金價採集模組
//!
//! 金價分成兩支 API：
//!
//! - `currentGoldRate`：回傳 `{ "data": "<html>" }`，表格內含 22K/18K/14K 每克金價。
//! - `getrates`：依國家與州別回傳 `24kt`/`22kt` 字串(例︰`"13,800.00 INR"`)與 `updated_time`。
//!
//! 第二支 API 只補第一支沒有的純度。

/// 兩段式 API 解析
pub mod rate;

const HOST: &str = "www.malabargoldanddiamonds.com";

pub struct Malabar {
    /// getrates API 的州別，例︰Karnataka
    state: String,
}

impl Malabar {
    pub fn new(state: &str) -> Self {
        Malabar {
            state: state.to_string(),
        }
    }
}
