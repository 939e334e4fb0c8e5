// src/services/classifier.rs

//! Keyword-based availability classification.

use crate::models::Product;

/// Decide whether a page body advertises the product as available.
///
/// Case-insensitive substring match over the whole body. True only when an
/// available keyword is present and no soldout keyword is. An empty
/// available list never yields true. Blank keywords are ignored.
pub fn classify(body: &str, available_keywords: &[String], soldout_keywords: &[String]) -> bool {
    let haystack = body.to_lowercase();

    matches(&haystack, available_keywords).next().is_some()
        && matches(&haystack, soldout_keywords).next().is_none()
}

/// Keywords found in `body_lower`, which must already be lowercased.
///
/// Blank keywords never match.
pub fn matches<'a>(
    body_lower: &'a str,
    keywords: &'a [String],
) -> impl Iterator<Item = &'a String> + 'a {
    keywords.iter().filter(move |k| {
        let k = k.trim();
        !k.is_empty() && body_lower.contains(&k.to_lowercase())
    })
}

/// Classify a body against a product's keyword lists.
pub fn classify_product(body: &str, product: &Product) -> bool {
    classify(body, &product.available_keywords, &product.soldout_keywords)
}
