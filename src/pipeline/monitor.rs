// src/pipeline/monitor.rs

//! One monitoring pass over all products.
//!
//! Fetches run concurrently, bounded and paced per host. Classification,
//! transition evaluation, notification and state mutation then happen
//! sequentially in config order, so the state map has a single writer.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::time::Instant;

use crate::error::FetchError;
use crate::models::{Config, MAX_CONCURRENCY_CAP, Product};
use crate::pipeline::transition::evaluate;
use crate::services::{FetchResult, Fetcher, Notifier, classify_product};
use crate::storage::StateStore;
use crate::utils::get_domain;

/// Run-level knobs derived from configuration.
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub max_concurrent: usize,
    pub request_delay: Duration,
    pub jitter_ms: u64,
    pub fetch_timeout: Duration,
    /// Write the updated state back; off for dry runs
    pub persist_state: bool,
}

impl From<&Config> for MonitorOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_concurrent: config.monitor.max_concurrent,
            request_delay: Duration::from_millis(config.monitor.request_delay_ms),
            jitter_ms: config.monitor.jitter_ms,
            fetch_timeout: Duration::from_secs(config.fetch.timeout_secs),
            persist_state: true,
        }
    }
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl MonitorOptions {
    /// Gap between two requests to the same host.
    fn pause(&self) -> Duration {
        let jitter = if self.jitter_ms > 0 {
            fastrand::u64(0..self.jitter_ms)
        } else {
            0
        };
        self.request_delay + Duration::from_millis(jitter)
    }
}

/// Counters for a finished run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub products: usize,
    pub fetch_failures: usize,
    /// Products whose page answered with a non-2xx final status
    pub http_errors: usize,
    pub became_available: usize,
    pub still_available: usize,
    pub unavailable: usize,
    pub notified: usize,
    pub notify_failures: usize,
    /// Set when the state could not be persisted
    pub state_error: Option<String>,
}

impl RunSummary {
    pub fn state_saved(&self) -> bool {
        self.state_error.is_none()
    }
}

/// Run one pass stamped with the current time.
pub async fn run_monitor(
    products: &[Product],
    fetcher: &Fetcher,
    store: &dyn StateStore,
    notifier: &dyn Notifier,
    options: &MonitorOptions,
) -> RunSummary {
    let now = Utc::now().timestamp();
    run_monitor_at(products, fetcher, store, notifier, options, now).await
}

/// Run one pass using `now` (epoch seconds) as the run timestamp.
pub async fn run_monitor_at(
    products: &[Product],
    fetcher: &Fetcher,
    store: &dyn StateStore,
    notifier: &dyn Notifier,
    options: &MonitorOptions,
    now: i64,
) -> RunSummary {
    let mut summary = RunSummary {
        products: products.len(),
        ..RunSummary::default()
    };

    let mut state = store.load().await;
    log::info!(
        "Checking {} products ({} known in state)",
        products.len(),
        state.len()
    );

    let fetched = fetch_all(products, fetcher, options).await;

    for (product, outcome) in products.iter().zip(fetched) {
        let page = match outcome {
            Ok(page) => page,
            Err(e) => {
                summary.fetch_failures += 1;
                log::warn!("Skipping {}: {}", product.name, e);
                continue;
            }
        };

        if !page.succeeded {
            summary.http_errors += 1;
            log::warn!(
                "{} answered HTTP {}; treating as unavailable",
                product.name,
                page.status_code
            );
        }

        let verdict = classify_product(&page.body, product);
        let transition = evaluate(product, verdict, state.get(&product.url), now);

        if let Some(event) = &transition.event {
            summary.became_available += 1;
            match notifier.notify(&event.message()).await {
                Ok(()) => {
                    summary.notified += 1;
                    log::info!("Notified: {}", product.name);
                }
                Err(e) => {
                    // At-most-once: state still moves to AVAILABLE below.
                    summary.notify_failures += 1;
                    log::error!("Notification failed for {}: {}", product.name, e);
                }
            }
        } else if verdict {
            summary.still_available += 1;
            log::info!("Still available: {}", product.name);
        } else {
            summary.unavailable += 1;
            log::info!("Out of stock: {}", product.name);
        }

        if let Some(record) = transition.record {
            state.insert(product.url.clone(), record);
        }
    }

    if !options.persist_state {
        log::info!("Dry run: state at {} left unchanged", store.location());
    } else if let Err(e) = store.save(&state).await {
        log::error!(
            "Failed to save state ({}); next run may repeat notifications",
            e
        );
        summary.state_error = Some(e.to_string());
    }

    log::info!(
        "Run complete: {} products, {} newly available, {} notified, {} out of stock, {} fetch failures",
        summary.products,
        summary.became_available,
        summary.notified,
        summary.unavailable,
        summary.fetch_failures
    );

    summary
}

/// Start times handed out per host.
///
/// Requests to one host start at least `gap` apart. Different hosts do not
/// wait on each other.
#[derive(Debug, Default)]
struct HostPacer {
    last_start: Mutex<HashMap<String, Instant>>,
}

impl HostPacer {
    /// Reserve the next start time for `host`.
    fn reserve(&self, host: &str, gap: Duration) -> Instant {
        let now = Instant::now();
        let mut slots = match self.last_start.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let start = match slots.get(host) {
            Some(previous) => (*previous + gap).max(now),
            None => now,
        };
        slots.insert(host.to_string(), start);
        start
    }
}

/// Fetch every product page with bounded concurrency.
///
/// Results come back in the same order as `products`.
async fn fetch_all(
    products: &[Product],
    fetcher: &Fetcher,
    options: &MonitorOptions,
) -> Vec<Result<FetchResult, FetchError>> {
    let concurrency = options.max_concurrent.clamp(1, MAX_CONCURRENCY_CAP);
    let pacer = &HostPacer::default();

    let mut results: Vec<(usize, Result<FetchResult, FetchError>)> =
        stream::iter(products.iter().enumerate())
            .map(|(index, product)| async move {
                let host = get_domain(&product.url).unwrap_or_else(|| product.url.clone());
                let start = pacer.reserve(&host, options.pause());
                let wait = start.saturating_duration_since(Instant::now());
                if !wait.is_zero() {
                    log::debug!("Waiting {:?} before next request to {}", wait, host);
                    tokio::time::sleep_until(start).await;
                }
                (index, fetcher.fetch(&product.url, options.fetch_timeout).await)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}
