//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Product;

/// Upper bound on parallel fetches; more risks rate limiting from shop hosts.
pub const MAX_CONCURRENCY_CAP: usize = 8;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Messaging API credentials and endpoint
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// HTTP fetching and retry behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Run-level settings (concurrency, pacing, state location)
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Keyword lists applied to products that don't override them
    #[serde(default)]
    pub defaults: KeywordDefaults,

    /// Products to watch
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve configured products, filling in default keyword lists.
    ///
    /// Keywords are lowercased here so the classifier only lowercases the body.
    pub fn products(&self) -> Vec<Product> {
        self.products
            .iter()
            .map(|p| Product {
                name: p.name.clone(),
                url: p.url.clone(),
                available_keywords: lowercase_all(
                    p.available_keywords
                        .as_ref()
                        .unwrap_or(&self.defaults.available_keywords),
                ),
                soldout_keywords: lowercase_all(
                    p.soldout_keywords
                        .as_ref()
                        .unwrap_or(&self.defaults.soldout_keywords),
                ),
                category_tag: p.category_tag.clone(),
            })
            .collect()
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.backoff_factor_secs < 0.0 || !self.fetch.backoff_factor_secs.is_finite() {
            return Err(AppError::validation(
                "fetch.backoff_factor_secs must be a non-negative number",
            ));
        }
        if self.fetch.user_agents.iter().all(|ua| ua.trim().is_empty()) {
            return Err(AppError::validation("fetch.user_agents is empty"));
        }
        if self.telegram.timeout_secs == 0 {
            return Err(AppError::validation("telegram.timeout_secs must be > 0"));
        }
        if !(1..=MAX_CONCURRENCY_CAP).contains(&self.monitor.max_concurrent) {
            return Err(AppError::validation(format!(
                "monitor.max_concurrent must be between 1 and {MAX_CONCURRENCY_CAP}"
            )));
        }
        if self.monitor.state_file.trim().is_empty() {
            return Err(AppError::validation("monitor.state_file is empty"));
        }
        if self.products.is_empty() {
            return Err(AppError::validation("No products defined"));
        }

        let mut seen = HashSet::new();
        for product in &self.products {
            if product.name.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "product with url {} has an empty name",
                    product.url
                )));
            }
            let parsed = Url::parse(&product.url)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::validation(format!(
                    "product {} has unsupported url scheme '{}'",
                    product.name,
                    parsed.scheme()
                )));
            }
            if !seen.insert(product.url.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate product url {}",
                    product.url
                )));
            }
        }
        Ok(())
    }
}

fn lowercase_all(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Messaging API settings. Credentials may also come from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,

    #[serde(default)]
    pub chat_id: Option<String>,

    /// Base URL of the Bot API
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Request timeout for message delivery
    #[serde(default = "defaults::notify_timeout")]
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: defaults::api_base(),
            timeout_secs: defaults::notify_timeout(),
        }
    }
}

/// HTTP client and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Retries after the first attempt
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Exponential backoff base in seconds
    #[serde(default = "defaults::backoff_factor")]
    pub backoff_factor_secs: f64,

    /// Ceiling for a single backoff sleep
    #[serde(default = "defaults::backoff_max")]
    pub backoff_max_secs: f64,

    /// Status codes that trigger a retry
    #[serde(default = "defaults::retry_statuses")]
    pub retry_statuses: Vec<u16>,

    /// Redirect hops followed before giving up
    #[serde(default = "defaults::max_redirects")]
    pub max_redirects: usize,

    /// User-Agent pool; one is picked per request
    #[serde(default = "defaults::user_agents")]
    pub user_agents: Vec<String>,

    /// Accept-Language header value
    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::timeout(),
            max_retries: defaults::max_retries(),
            backoff_factor_secs: defaults::backoff_factor(),
            backoff_max_secs: defaults::backoff_max(),
            retry_statuses: defaults::retry_statuses(),
            max_redirects: defaults::max_redirects(),
            user_agents: defaults::user_agents(),
            accept_language: defaults::accept_language(),
        }
    }
}

/// Run-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Maximum concurrent page fetches
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Pause before each fetch in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Random extra pause added to `request_delay_ms`
    #[serde(default = "defaults::jitter")]
    pub jitter_ms: u64,

    /// Path of the JSON state file
    #[serde(default = "defaults::state_file")]
    pub state_file: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::max_concurrent(),
            request_delay_ms: defaults::request_delay(),
            jitter_ms: defaults::jitter(),
            state_file: defaults::state_file(),
        }
    }
}

/// Keyword lists used when a product doesn't set its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordDefaults {
    #[serde(default = "defaults::available_keywords")]
    pub available_keywords: Vec<String>,

    #[serde(default = "defaults::soldout_keywords")]
    pub soldout_keywords: Vec<String>,
}

impl Default for KeywordDefaults {
    fn default() -> Self {
        Self {
            available_keywords: defaults::available_keywords(),
            soldout_keywords: defaults::soldout_keywords(),
        }
    }
}

/// A product entry as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
    pub name: String,

    pub url: String,

    #[serde(default)]
    pub available_keywords: Option<Vec<String>>,

    #[serde(default)]
    pub soldout_keywords: Option<Vec<String>>,

    /// Changes the notification wording (`DISCOVERY` for non-stock news)
    #[serde(default, alias = "country_code")]
    pub category_tag: Option<String>,
}

mod defaults {
    // Telegram defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn notify_timeout() -> u64 {
        20
    }

    // Fetch defaults
    pub fn timeout() -> u64 {
        40
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn backoff_factor() -> f64 {
        1.5
    }
    pub fn backoff_max() -> f64 {
        120.0
    }
    pub fn retry_statuses() -> Vec<u16> {
        vec![429, 500, 502, 503, 504]
    }
    pub fn max_redirects() -> usize {
        10
    }
    pub fn user_agents() -> Vec<String> {
        vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".into(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15".into(),
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36".into(),
        ]
    }
    pub fn accept_language() -> String {
        "es-AR,es;q=0.9,en;q=0.8".into()
    }

    // Monitor defaults
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn request_delay() -> u64 {
        2000
    }
    pub fn jitter() -> u64 {
        500
    }
    pub fn state_file() -> String {
        "state.json".into()
    }

    // Keyword defaults
    pub fn available_keywords() -> Vec<String> {
        vec![
            "agregar al carrito".into(),
            "en stock".into(),
            "comprar ahora".into(),
        ]
    }
    pub fn soldout_keywords() -> Vec<String> {
        vec!["agotado".into(), "sin stock".into(), "no disponible".into()]
    }
}
