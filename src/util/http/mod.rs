use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use once_cell::sync::{Lazy, OnceCell};
use reqwest::{header, Client, Method, RequestBuilder, Response};

use crate::logging::Logger;

pub mod element;
pub mod user_agent;

/// A semaphore for limiting concurrent requests.
///
/// 每個來源同時只會有一兩個請求，限制 4 個並發已足夠。
static SEMAPHORE: Lazy<tokio::sync::Semaphore> = Lazy::new(|| tokio::sync::Semaphore::new(4));

/// A singleton instance of the reqwest client.
static CLIENT: OnceCell<Client> = OnceCell::new();

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("http"));

/// HTTP 請求失敗時的最大重試次數。
const MAX_RETRIES: usize = 2;

/// Returns the reqwest client singleton instance or creates one if it doesn't exist.
///
/// The client keeps a cookie store, so consecutive requests to the same host
/// share the session cookies handed out by the first response.
fn get_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            // ===== 壓縮 =====
            .brotli(true)
            .deflate(true)
            .gzip(true)
            .zstd(true)
            // ===== 超時設置 =====
            .connect_timeout(Duration::from_secs(8))
            .timeout(Duration::from_secs(20))
            // ===== TCP 優化 =====
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            // ===== 連接池 =====
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            // ===== Cookie 和重定向 =====
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            // ===== Headers =====
            .referer(true)
            .user_agent(user_agent::gen_random_ua())
            .build()
            .map_err(|e| anyhow!("Failed to create reqwest client: {:?}", e))
    })
}

pub async fn get_response(url: &str, headers: Option<header::HeaderMap>) -> Result<Response> {
    send(Method::GET, url, headers).await
}

/// Performs an HTTP GET request and returns the response as text.
///
/// Non-success status codes are turned into errors so that a blocked or
/// missing page never reaches a parser.
pub async fn get(url: &str, headers: Option<header::HeaderMap>) -> Result<String> {
    get_response(url, headers)
        .await?
        .error_for_status()
        .map_err(|e| anyhow!("Unexpected status from {}: {:?}", url, e))?
        .text()
        .await
        .map_err(|e| anyhow!("Error parsing response text: {:?}", e))
}

/// Builds a `HeaderMap` from name/value pairs, skipping invalid entries.
pub fn headers(pairs: &[(&str, &str)]) -> header::HeaderMap {
    let mut map = header::HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        match (
            header::HeaderName::from_bytes(name.as_bytes()),
            header::HeaderValue::from_str(value),
        ) {
            (Ok(n), Ok(v)) => {
                map.insert(n, v);
            }
            _ => {
                LOGGER.warn(format!("Skip invalid header {}: {}", name, value));
            }
        }
    }

    map
}

/// 程式結束前呼叫，確保 http 日誌已寫入檔案
pub fn flush_log() {
    LOGGER.flush();
}

/// Sends an HTTP request using the specified method, URL and headers with retries on failure.
///
/// A failed attempt is logged and retried after an exponential delay. If all
/// attempts fail, the error includes the retry count and the last underlying error.
async fn send(method: Method, url: &str, headers: Option<header::HeaderMap>) -> Result<Response> {
    let visit_log = format!("{method}:{url}");
    let client = get_client()?;
    let mut rb: RequestBuilder = client.request(method, url);
    let mut last_error = String::new();

    if let Some(h) = headers {
        rb = rb.headers(h);
    }

    for attempt in 1..=MAX_RETRIES {
        let msg = format!("Attempt {} to send {}", attempt, visit_log);
        let rb_clone = rb
            .try_clone()
            .ok_or_else(|| anyhow!("Failed to clone RequestBuilder"))?;
        let permit = SEMAPHORE.acquire().await;
        let start = Instant::now();
        let res = rb_clone.send().await;
        let elapsed = start.elapsed().as_millis();
        drop(permit);

        match res {
            Ok(response) => {
                LOGGER.info(format!("{} {} {} ms", msg, response.status(), elapsed));
                return Ok(response);
            }
            Err(why) => {
                last_error = format!("{:?}", why);
                LOGGER.error(format!("{} failed because {:?}. {} ms", msg, why, elapsed));
                if attempt < MAX_RETRIES {
                    tokio::time::sleep(Duration::from_secs(2u64.pow(attempt as u32))).await;
                }
            }
        }
    }

    Err(anyhow!(
        "Failed to send request to {} after {} attempts; last error: {}",
        url,
        MAX_RETRIES,
        last_error
    ))
}
