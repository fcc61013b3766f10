//! 來源網站擷取金價時可能發生的錯誤
//!
//! 每個來源的錯誤最後都會變成一筆 `success = false` 的報價，訊息即為 `Display` 的內容。

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// 網路請求失敗(連線、逾時、非 2xx 狀態碼)
    #[error("Request failed: {0}")]
    Transport(String),

    /// 頁面上找不到預期的元素或內嵌資料
    #[error("{0}")]
    NotFound(String),

    /// 內嵌資料不是合法的 JSON
    #[error("Failed to parse JSON: {0}")]
    MalformedPayload(String),

    /// 自由文字中找不到任何金額
    #[error("{0}")]
    ParseFailure(String),

    /// 解析成功但沒有任何純度的價格
    #[error("{0}")]
    NoRatesFound(String),

    /// 來源網站回傳驗證碼頁面
    #[error("Blocked by {0} captcha")]
    Blocked(String),

    /// 其他非預期的錯誤，包含工作執行緒 panic
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<anyhow::Error> for ExtractError {
    fn from(why: anyhow::Error) -> Self {
        ExtractError::Transport(why.to_string())
    }
}
