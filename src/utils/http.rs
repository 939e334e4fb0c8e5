// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA, USER_AGENT,
};

use crate::error::{FetchError, Result};
use crate::models::FetchConfig;

/// Accept header sent with page requests.
pub const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Create the asynchronous HTTP client used for page fetches.
///
/// Identity headers are set per request, so the client carries none.
pub fn create_async_client(config: &FetchConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .build()?;
    Ok(client)
}

/// Create the client used for messaging API calls.
pub fn create_api_client(timeout_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// Pick a user agent from the pool at random.
///
/// Blank entries are skipped; an all-blank pool yields `None`.
pub fn pick_user_agent(pool: &[String]) -> Option<&str> {
    let usable: Vec<&str> = pool
        .iter()
        .map(|ua| ua.trim())
        .filter(|ua| !ua.is_empty())
        .collect();
    if usable.is_empty() {
        return None;
    }
    Some(usable[fastrand::usize(..usable.len())])
}

/// Build browser-like request headers for one page fetch.
pub fn browser_headers(
    user_agent: &str,
    accept_language: &str,
) -> std::result::Result<HeaderMap, FetchError> {
    let value = |s: &str| {
        HeaderValue::from_str(s).map_err(|e| FetchError::Client(format!("header '{s}': {e}")))
    };

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, value(user_agent)?);
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, value(accept_language)?);
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    Ok(headers)
}
