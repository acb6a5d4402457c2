//! HTTP retry helpers for transient backend errors.
//!
//! Every request the [`HttpReportStore`](crate::http::HttpReportStore)
//! makes goes through [`send_json`], which retries connection failures,
//! timeouts, HTTP 429 and HTTP 5xx with exponential backoff. Other 4xx
//! responses are permanent and returned immediately as
//! [`StoreError::Status`].

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::StoreError;

/// Retry settings for backend requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << (attempt - 1).min(16))
    }
}

/// Sends a request and decodes the JSON response body into `T`.
///
/// The `build_request` closure is called for each attempt because a
/// [`reqwest::RequestBuilder`] is consumed by `send()`.
///
/// # Errors
///
/// Returns [`StoreError`] if the request still fails after all retries,
/// the backend answers with a non-retryable status, or the body cannot
/// be decoded as `T`.
#[allow(clippy::future_not_send)]
pub async fn send_json<T, F>(policy: &RetryPolicy, build_request: F) -> Result<T, StoreError>
where
    T: DeserializeOwned,
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(policy, &build_request).await?;
    let url = response.url().to_string();
    let text = response.text().await?;

    serde_json::from_str(&text).map_err(|e| {
        log::error!("Failed to decode response from {url}: {e}");
        StoreError::Decode {
            message: format!("{e} (url={url}, received {} bytes)", text.len()),
        }
    })
}

/// Core retry loop. Returns the first 2xx/3xx response.
#[allow(clippy::future_not_send)]
async fn send_inner<F>(policy: &RetryPolicy, build_request: &F) -> Result<reqwest::Response, StoreError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let max_retries = policy.max_retries;
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = policy.delay(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_retries {
                    log::warn!("  transient error: {e}");
                    attempt += 1;
                    continue;
                }
                return Err(StoreError::Http(e));
            }
            Ok(response) => {
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    if attempt < max_retries {
                        log::warn!("  HTTP {status} from {}", response.url());
                        attempt += 1;
                        continue;
                    }
                    return Err(StoreError::Status {
                        status: status.as_u16(),
                        url: response.url().to_string(),
                    });
                }

                if status.is_client_error() {
                    return Err(StoreError::Status {
                        status: status.as_u16(),
                        url: response.url().to_string(),
                    });
                }

                return Ok(response);
            }
        }
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}
