/// K 金純度換算
pub mod karat_ratio;
