use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// 金的純度(K 金)
#[derive(
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Debug,
    Copy,
    Clone,
)]
#[strum(ascii_case_insensitive)]
pub enum Purity {
    /// 24K 純金
    #[serde(rename = "24K")]
    #[strum(serialize = "24K")]
    K24,
    /// 22K (22/24)
    #[serde(rename = "22K")]
    #[strum(serialize = "22K")]
    K22,
    /// 18K (18/24)
    #[serde(rename = "18K")]
    #[strum(serialize = "18K")]
    K18,
    /// 14K (14/24)
    #[serde(rename = "14K")]
    #[strum(serialize = "14K")]
    K14,
}

impl Purity {
    /// 純度的 K 數，例︰22K => 22
    pub fn karat(&self) -> u32 {
        match self {
            Purity::K24 => 24,
            Purity::K22 => 22,
            Purity::K18 => 18,
            Purity::K14 => 14,
        }
    }

    /// 帳本與報表使用的標籤，例︰"22K"
    pub fn label(&self) -> &'static str {
        match self {
            Purity::K24 => "24K",
            Purity::K22 => "22K",
            Purity::K18 => "18K",
            Purity::K14 => "14K",
        }
    }

    /// 由 K 數轉回純度，不在清單內的 K 數回傳 None
    pub fn from_karat(karat: u32) -> Option<Purity> {
        Self::iterator().find(|p| p.karat() == karat)
    }

    /// 由高至低列出所有純度
    pub fn iterator() -> impl Iterator<Item = Self> {
        Purity::iter()
    }
}

/// 金價來源網站
#[derive(Display, EnumString, EnumIter, PartialEq, Eq, Hash, Debug, Copy, Clone)]
#[strum(ascii_case_insensitive)]
pub enum Source {
    /// Tanishq (data-* 屬性)
    #[strum(to_string = "Tanishq", serialize = "tanishq")]
    Tanishq,
    /// Malabar Gold & Diamonds (兩段式 API)
    #[strum(to_string = "Malabar Gold & Diamonds", serialize = "malabar")]
    Malabar,
    /// GRT Jewels (HTML 內嵌跳脫過的 JSON)
    #[strum(to_string = "GRT Jewels", serialize = "grt")]
    Grt,
    /// Google 搜尋結果的金價卡片
    #[strum(to_string = "Google", serialize = "google")]
    Google,
}

impl Source {
    /// 寫入帳本 `source` 欄位的名稱
    pub fn name(&self) -> String {
        self.to_string()
    }
}

/// 設定檔以顯示名稱或簡稱表示來源，例︰"malabar"
impl Serialize for Source {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Source {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Source::from_str(s.trim()).map_err(|_| de::Error::custom(format!("unknown source '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_serde() {
        let sources: Vec<Source> = serde_json::from_str(r#"["malabar", "GRT Jewels", " Google "]"#).unwrap();
        assert_eq!(sources, vec![Source::Malabar, Source::Grt, Source::Google]);
        assert_eq!(serde_json::to_string(&Source::Malabar).unwrap(), "\"Malabar Gold & Diamonds\"");
        assert!(serde_json::from_str::<Source>("\"kalyan\"").is_err());
    }

    #[test]
    fn test_purity_labels() {
        assert_eq!(Purity::K22.label(), "22K");
        assert_eq!(Purity::K18.to_string(), "18K");
        assert_eq!(Purity::from_str("24k").unwrap(), Purity::K24);
        assert_eq!(Purity::from_karat(14), Some(Purity::K14));
        assert_eq!(Purity::from_karat(9), None);
        assert!(Purity::from_str("9K").is_err());
    }

    #[test]
    fn test_purity_serde() {
        let json = serde_json::to_string(&Purity::K22).unwrap();
        assert_eq!(json, "\"22K\"");
        let p: Purity = serde_json::from_str("\"14K\"").unwrap();
        assert_eq!(p, Purity::K14);
    }

    #[test]
    fn test_source_names() {
        assert_eq!(Source::Malabar.name(), "Malabar Gold & Diamonds");
        assert_eq!(Source::Grt.to_string(), "GRT Jewels");
        assert_eq!(Source::from_str("google").unwrap(), Source::Google);
        assert_eq!(Source::from_str("GRT Jewels").unwrap(), Source::Grt);
        assert_eq!(Source::iter().count(), 4);
    }
}
