// src/services/fetcher.rs

//! Page fetcher with retry and backoff.
//!
//! Every fetch sends a randomly chosen user agent plus browser-like headers.
//! Transport errors and statuses in the retry list are retried with
//! exponential backoff; any other response, including 4xx, is final.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::error::{FetchError, Result};
use crate::models::FetchConfig;
use crate::utils::http::{browser_headers, create_async_client, pick_user_agent};

/// Outcome of a page fetch that produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub body: String,
    pub status_code: u16,
    /// True for 2xx responses
    pub succeeded: bool,
}

impl From<RawResponse> for FetchResult {
    fn from(raw: RawResponse) -> Self {
        Self {
            succeeded: (200..300).contains(&raw.status),
            status_code: raw.status,
            body: raw.body,
        }
    }
}

/// A single HTTP exchange, before retry handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Transport used by [`Fetcher`]. One call is one attempt.
#[async_trait]
pub trait HttpSource: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: HeaderMap,
        timeout: Duration,
    ) -> std::result::Result<RawResponse, FetchError>;
}

/// `HttpSource` backed by a reqwest client. Redirects are followed by the client.
pub struct ReqwestSource {
    client: reqwest::Client,
}

impl ReqwestSource {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }
}

#[async_trait]
impl HttpSource for ReqwestSource {
    async fn get(
        &self,
        url: &str,
        headers: HeaderMap,
        timeout: Duration,
    ) -> std::result::Result<RawResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .headers(headers)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    FetchError::Client(e.to_string())
                } else {
                    FetchError::transport(url, e)
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::transport(url, e))?;
        Ok(RawResponse { status, body })
    }
}

/// When and how long to retry.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Exponential base in seconds
    pub backoff_factor: f64,
    /// Ceiling for one sleep in seconds
    pub backoff_max: f64,
    /// Statuses that trigger a retry
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_factor: config.backoff_factor_secs,
            backoff_max: config.backoff_max_secs,
            retry_statuses: config.retry_statuses.clone(),
        }
    }
}

impl RetryPolicy {
    /// Whether a response with `status` should be retried.
    pub fn is_retryable(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Sleep before retry number `retry` (1-based).
    ///
    /// The first retry is immediate, then `factor * 2^(retry - 2)`:
    /// 0s, 1.5s, 3s, 6s... for a factor of 1.5.
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry <= 1 || self.backoff_factor <= 0.0 {
            return Duration::ZERO;
        }
        let exponent = (retry - 2).min(30) as i32;
        let secs = (self.backoff_factor * 2f64.powi(exponent)).min(self.backoff_max.max(0.0));
        Duration::from_secs_f64(secs)
    }
}

/// Why the last attempt asked for a retry.
enum RetryCause {
    Status(u16),
    Transport(FetchError),
}

/// Fetches product pages.
pub struct Fetcher {
    source: Arc<dyn HttpSource>,
    policy: RetryPolicy,
    user_agents: Vec<String>,
    accept_language: String,
}

impl Fetcher {
    /// Create a fetcher over the real network.
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        let source = ReqwestSource::new(config)?;
        Ok(Self::new(Arc::new(source), config))
    }

    /// Create a fetcher over an arbitrary transport.
    pub fn new(source: Arc<dyn HttpSource>, config: &FetchConfig) -> Self {
        Self {
            source,
            policy: RetryPolicy::from(config),
            user_agents: config.user_agents.clone(),
            accept_language: config.accept_language.clone(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch `url`, retrying transient failures.
    ///
    /// A non-retryable response (any status) is returned as `FetchResult`.
    /// `FetchError` means no usable response was obtained.
    pub async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<FetchResult, FetchError> {
        let user_agent = pick_user_agent(&self.user_agents)
            .ok_or_else(|| FetchError::Client("user agent pool is empty".into()))?;
        let headers = browser_headers(user_agent, &self.accept_language)?;

        let mut retry = 0;
        loop {
            let cause = match self.source.get(url, headers.clone(), timeout).await {
                Ok(raw) if !self.policy.is_retryable(raw.status) => {
                    log::debug!("GET {} -> {}", url, raw.status);
                    return Ok(FetchResult::from(raw));
                }
                Ok(raw) => RetryCause::Status(raw.status),
                Err(e @ FetchError::Client(_)) => return Err(e),
                Err(e) => RetryCause::Transport(e),
            };

            if retry >= self.policy.max_retries {
                return Err(match cause {
                    RetryCause::Status(status) => FetchError::RetriesExhausted {
                        url: url.to_string(),
                        status,
                    },
                    RetryCause::Transport(e) => e,
                });
            }

            retry += 1;
            let delay = self.policy.backoff(retry);
            match &cause {
                RetryCause::Status(status) => log::debug!(
                    "GET {} -> {}; retry {}/{} in {:?}",
                    url,
                    status,
                    retry,
                    self.policy.max_retries,
                    delay
                ),
                RetryCause::Transport(e) => log::debug!(
                    "GET {} failed ({}); retry {}/{} in {:?}",
                    url,
                    e,
                    retry,
                    self.policy.max_retries,
                    delay
                ),
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}
