/// 由 24K 記錄推算缺少的純度
pub mod derived_purity;
