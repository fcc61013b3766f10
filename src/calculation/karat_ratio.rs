use rust_decimal::{prelude::ToPrimitive, Decimal};
use rust_decimal_macros::dec;

use crate::declare::Purity;

/// 純金的 K 數
const PURE_KARAT: Decimal = dec!(24);

/// 乘上比例後保留的小數位數
const FRACTION_DP: u32 = 10;

/// 純度相對於 24K 的比例，例︰22K => 22/24
pub fn fraction(purity: Purity) -> Decimal {
    Decimal::from(purity.karat()) / PURE_KARAT
}

/// 由 24K 每克價格推算指定純度的每克價格。
///
/// 乘上純度比例後以銀行家捨入法取整數，
/// 例︰24K=10000 => 22K=9167、18K=7500。
pub fn derive_price(price_24k: i64, target: Purity) -> i64 {
    // 22/24、14/24 是循環小數，先去掉最後幾位的誤差再取整數
    (Decimal::from(price_24k) * fraction(target))
        .round_dp(FRACTION_DP)
        .round()
        .to_i64()
        .unwrap_or_default()
}

/// 將 `gram_basis` 克的報價換算成每克價格並取整數
pub fn per_gram(price: Decimal, gram_basis: u32) -> i64 {
    if gram_basis == 0 {
        return 0;
    }

    (price / Decimal::from(gram_basis))
        .round()
        .to_i64()
        .unwrap_or_default()
}

/// 由 24K 每克價格推算出多種純度，結果不含 24K 本身
pub fn derive_all(price_24k: i64, targets: &[Purity]) -> Vec<(Purity, i64)> {
    targets
        .iter()
        .filter(|p| **p != Purity::K24)
        .map(|p| (*p, derive_price(price_24k, *p)))
        .collect()
}
