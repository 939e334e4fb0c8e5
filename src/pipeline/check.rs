// src/pipeline/check.rs

//! Single-URL probe: fetch and classify without touching state.

use std::time::Duration;

use crate::error::Result;
use crate::models::Product;
use crate::services::{FetchResult, Fetcher, classify_product, matches};

/// Outcome of probing one URL.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub page: FetchResult,
    pub available: bool,
    /// Available keywords found in the body
    pub matched_available: Vec<String>,
    /// Soldout keywords found in the body
    pub matched_soldout: Vec<String>,
}

/// Fetch `product.url` and report which keywords matched.
pub async fn run_check(
    product: &Product,
    fetcher: &Fetcher,
    timeout: Duration,
) -> Result<CheckReport> {
    let page = fetcher.fetch(&product.url, timeout).await?;
    let available = classify_product(&page.body, product);

    let body = page.body.to_lowercase();
    let matched_available = matches(&body, &product.available_keywords)
        .cloned()
        .collect();
    let matched_soldout = matches(&body, &product.soldout_keywords)
        .cloned()
        .collect();

    log::info!(
        "{} -> HTTP {}, {} bytes, available={}",
        product.url,
        page.status_code,
        page.body.len(),
        available
    );

    Ok(CheckReport {
        page,
        available,
        matched_available,
        matched_soldout,
    })
}
