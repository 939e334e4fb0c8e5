//! Service layer for the monitor.
//!
//! This module contains the business logic for:
//! - Page fetching with retry (`Fetcher`)
//! - Keyword availability classification (`classify`)
//! - Notification delivery (`Notifier`)

pub mod classifier;
pub mod fetcher;
pub mod notifier;

pub use classifier::{classify, classify_product, matches};
pub use fetcher::{FetchResult, Fetcher, HttpSource, RawResponse, ReqwestSource, RetryPolicy};
pub use notifier::{LogNotifier, Notifier, TelegramNotifier};
