//! Product data structure.

/// Tag value that turns the "back in stock" wording into a "news" wording.
pub const DISCOVERY_TAG: &str = "DISCOVERY";

/// A monitored product page, resolved from configuration.
///
/// Keyword lists are already lowercased. The URL is the state key and is
/// used exactly as configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Display name used in notifications
    pub name: String,

    /// Page URL (unique key)
    pub url: String,

    /// Phrases that indicate the product can be bought
    pub available_keywords: Vec<String>,

    /// Phrases that indicate the product is sold out
    pub soldout_keywords: Vec<String>,

    /// Optional category affecting notification wording
    pub category_tag: Option<String>,
}

impl Product {
    /// Whether notifications for this product announce news rather than stock.
    pub fn is_discovery(&self) -> bool {
        self.category_tag.as_deref() == Some(DISCOVERY_TAG)
    }
}
