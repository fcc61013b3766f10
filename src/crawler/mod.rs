use std::{any::Any, collections::BTreeMap, fmt, sync::Arc};

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::{stream::FuturesUnordered, StreamExt};
use rust_decimal::Decimal;

use crate::{
    config,
    crawler::{
        error::ExtractError, google::Google, grt::Grt, malabar::Malabar, tanishq::Tanishq,
    },
    declare::{Purity, Source},
    logging,
};

/// 擷取金價時的錯誤型別
pub mod error;
/// Google 搜尋結果的金價卡片
pub mod google;
/// GRT Jewels
pub mod grt;
/// Malabar Gold & Diamonds
pub mod malabar;
/// 共用 請求間隔、日期擷取
pub(super) mod share;
/// Tanishq
pub mod tanishq;

/// 純度標籤 => 每克價格(來源網站的原始字串)
pub type Rates = BTreeMap<String, String>;

/// 單一來源解析後的結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub rates: Rates,
    /// 來源頁面上標示的日期，沒有時由帳本以執行當天補上
    pub observed_date: Option<NaiveDate>,
}

impl Extraction {
    pub fn insert<S: Into<String>>(&mut self, purity: &str, price: S) {
        self.rates.insert(purity.to_string(), price.into());
    }

    pub fn contains(&self, purity: Purity) -> bool {
        self.rates.contains_key(purity.label())
    }
}

/// 單一來源在一次執行中的金價報價
///
/// `rates` 不為空若且唯若 `success` 為 true，請透過 `from_result`/`failed` 建立。
#[derive(Debug, Clone, PartialEq)]
pub struct GoldQuote {
    pub source: Source,
    pub success: bool,
    pub rates: Rates,
    pub observed_date: Option<NaiveDate>,
    pub error: Option<String>,
}

impl GoldQuote {
    pub fn from_result(source: Source, result: Result<Extraction, ExtractError>) -> Self {
        match result {
            Ok(extraction) if extraction.rates.is_empty() => Self::failed(
                source,
                ExtractError::NoRatesFound(format!("No rates found from {}", source)),
            ),
            Ok(extraction) => GoldQuote {
                source,
                success: true,
                rates: extraction.rates,
                observed_date: extraction.observed_date,
                error: None,
            },
            Err(why) => Self::failed(source, why),
        }
    }

    pub fn failed(source: Source, why: ExtractError) -> Self {
        GoldQuote {
            source,
            success: false,
            rates: Rates::new(),
            observed_date: None,
            error: Some(why.to_string()),
        }
    }
}

/// 金價來源
#[async_trait]
pub trait GoldRateSource: Send + Sync {
    fn source(&self) -> Source;

    /// 抓取並解析來源網站的金價
    async fn fetch_rates(&self) -> Result<Extraction, ExtractError>;
}

/// 一次執行的成功來源數量
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub successful: usize,
    pub total: usize,
}

impl Summary {
    pub fn new(quotes: &[GoldQuote]) -> Self {
        Summary {
            successful: quotes.iter().filter(|q| q.success).count(),
            total: quotes.len(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Successfully fetched rates from {}/{} sources",
            self.successful, self.total
        )
    }
}

/// 依設定建立要抓取的來源，重複的來源只保留第一個
pub fn build_sources(config: &config::Crawler) -> Vec<Arc<dyn GoldRateSource>> {
    let mut sources: Vec<Arc<dyn GoldRateSource>> = Vec::with_capacity(config.sources.len());
    let mut seen = Vec::with_capacity(config.sources.len());

    for source in &config.sources {
        if seen.contains(source) {
            continue;
        }
        seen.push(*source);

        let site: Arc<dyn GoldRateSource> = match source {
            Source::Tanishq => Arc::new(Tanishq {}),
            Source::Malabar => Arc::new(Malabar::new(&config.malabar_state)),
            Source::Grt => Arc::new(Grt {}),
            Source::Google => Arc::new(Google::new(Decimal::from(config.ten_gram_threshold))),
        };
        sources.push(site);
    }

    sources
}

/// 同時向所有來源抓取金價，依完成的先後順序回傳，每個來源必定有一筆報價
pub async fn fetch_all(sources: Vec<Arc<dyn GoldRateSource>>) -> Vec<GoldQuote> {
    let mut tasks = FuturesUnordered::new();

    for site in sources {
        let source = site.source();
        let handle = tokio::spawn(async move { site.fetch_rates().await });
        tasks.push(async move { (source, handle.await) });
    }

    let mut quotes = Vec::with_capacity(tasks.len());
    while let Some((source, joined)) = tasks.next().await {
        let quote = match joined {
            Ok(result) => GoldQuote::from_result(source, result),
            Err(why) => {
                let msg = if why.is_panic() {
                    panic_message(why.into_panic())
                } else {
                    why.to_string()
                };
                logging::error_file_async(format!("The {} task failed because {}", source, msg));
                GoldQuote::failed(source, ExtractError::Unexpected(msg))
            }
        };

        if let Some(why) = &quote.error {
            logging::warn_file_async(format!("{}: {}", quote.source, why));
        }

        quotes.push(quote);
    }

    quotes
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return s.to_string();
    }

    match payload.downcast::<String>() {
        Ok(s) => *s,
        Err(_) => "task panicked".to_string(),
    }
}
