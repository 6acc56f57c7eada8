// src/fetch/mod.rs
pub mod extract;
pub mod urls;

use std::time::Duration;

use reqwest::{Client, Response};
use tokio::time::sleep;
use tracing::{debug, error, warn};
use url::Url;

use crate::{config::HttpConfig, error::IngestError};

async fn get_core(client: &Client, url: &Url) -> Result<Response, reqwest::Error> {
    debug!("GET {}", url);
    client.get(url.clone()).send().await?.error_for_status()
}

const MAX_BACKOFF_MS: u64 = 60_000;

/// Delay before retry number `attempt` (1-based), capped at one minute.
pub(crate) fn backoff_delay(http: HttpConfig, attempt: u32) -> Duration {
    let ms = 2u64
        .checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| http.backoff_ms.checked_mul(factor))
        .unwrap_or(MAX_BACKOFF_MS)
        .min(MAX_BACKOFF_MS);
    Duration::from_millis(ms)
}

/// GET with exponential backoff: `backoff_ms`, `2 * backoff_ms`, ...
pub(crate) async fn get_with_retry(
    client: &Client,
    url: &Url,
    http: HttpConfig,
) -> Result<Response, IngestError> {
    let mut attempts = 0;
    loop {
        match get_core(client, url).await {
            Ok(resp) => return Ok(resp),
            Err(e) if attempts < http.max_retries => {
                attempts += 1;
                let backoff = backoff_delay(http, attempts);
                warn!(%url, attempt = attempts, delay_ms = backoff.as_millis() as u64, error = %e, "Retrying");
                sleep(backoff).await;
            }
            Err(e) => {
                error!(%url, error = %e, "Exhausted retries");
                return Err(IngestError::Http {
                    url: url.to_string(),
                    source: e,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(backoff_ms: u64) -> HttpConfig {
        HttpConfig {
            max_retries: u32::MAX,
            backoff_ms,
        }
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let h = http(500);
        assert_eq!(backoff_delay(h, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(h, 2), Duration::from_millis(1_000));
        assert_eq!(backoff_delay(h, 4), Duration::from_millis(4_000));
    }

    #[test]
    fn backoff_is_capped_for_large_attempts() {
        let cap = Duration::from_millis(MAX_BACKOFF_MS);
        assert_eq!(backoff_delay(http(500), 8), cap);
        assert_eq!(backoff_delay(http(500), 64), cap);
        assert_eq!(backoff_delay(http(500), u32::MAX), cap);
        assert_eq!(backoff_delay(http(u64::MAX), 2), cap);
        assert_eq!(backoff_delay(http(0), 100), Duration::ZERO);
    }
}
