/// 抓取金價並寫入帳本
pub mod gold_rate;
