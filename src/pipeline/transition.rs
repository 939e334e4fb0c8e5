// src/pipeline/transition.rs

//! Edge-triggered availability transitions.
//!
//! Each product is a two-state machine (UNAVAILABLE, AVAILABLE) starting in
//! UNAVAILABLE. Only UNAVAILABLE → AVAILABLE emits a notification.

use crate::models::{Product, StateRecord};
use crate::utils::escape_html;

/// A product that just became available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub product_name: String,
    pub url: String,
    pub discovery: bool,
}

impl NotificationEvent {
    fn for_product(product: &Product) -> Self {
        Self {
            product_name: product.name.clone(),
            url: product.url.clone(),
            discovery: product.is_discovery(),
        }
    }

    /// Headline shown in bold at the top of the message.
    pub fn label(&self) -> &'static str {
        if self.discovery {
            "¡Novedad detectada!"
        } else {
            "¡Hay stock!"
        }
    }

    /// Message body in Telegram HTML.
    pub fn message(&self) -> String {
        format!(
            "✅ <b>{}</b>\n<b>{}</b>\n{}",
            self.label(),
            escape_html(&self.product_name),
            escape_html(&self.url)
        )
    }
}

/// Result of evaluating one verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Record to persist; `None` leaves the prior record untouched
    pub record: Option<StateRecord>,
    /// Present only on UNAVAILABLE → AVAILABLE
    pub event: Option<NotificationEvent>,
}

/// Combine a fresh verdict with the prior record.
///
/// - absent/false + true: new AVAILABLE record stamped `now`, one event
/// - true + true: nothing changes, no event
/// - any + false: UNAVAILABLE record stamped `now`, no event
///
/// The timestamp not matching the new state is carried over from `prior`.
pub fn evaluate(
    product: &Product,
    verdict: bool,
    prior: Option<&StateRecord>,
    now: i64,
) -> Transition {
    let was_available = prior.is_some_and(|r| r.available);

    match (was_available, verdict) {
        (false, true) => Transition {
            record: Some(StateRecord {
                available: true,
                last_seen_available_at: Some(now),
                last_seen_unavailable_at: prior.and_then(|r| r.last_seen_unavailable_at),
            }),
            event: Some(NotificationEvent::for_product(product)),
        },
        (true, true) => Transition {
            record: None,
            event: None,
        },
        (_, false) => Transition {
            record: Some(StateRecord {
                available: false,
                last_seen_available_at: prior.and_then(|r| r.last_seen_available_at),
                last_seen_unavailable_at: Some(now),
            }),
            event: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DISCOVERY_TAG;

    fn product() -> Product {
        Product {
            name: "Consola".into(),
            url: "https://shop.example/consola".into(),
            available_keywords: vec!["comprar ahora".into()],
            soldout_keywords: vec!["agotado".into()],
            category_tag: None,
        }
    }

    #[test]
    fn test_first_available_notifies() {
        let t = evaluate(&product(), true, None, 100);
        assert_eq!(t.record, Some(StateRecord::seen_available(100)));
        assert!(t.event.is_some());
    }

    #[test]
    fn test_false_to_true_notifies_and_keeps_unavailable_stamp() {
        let prior = StateRecord::seen_unavailable(50);
        let t = evaluate(&product(), true, Some(&prior), 100);
        let record = t.record.unwrap();
        assert!(record.available);
        assert_eq!(record.last_seen_available_at, Some(100));
        assert_eq!(record.last_seen_unavailable_at, Some(50));
        assert!(t.event.is_some());
    }

    #[test]
    fn test_true_to_true_is_silent_and_unchanged() {
        let prior = StateRecord::seen_available(50);
        let t = evaluate(&product(), true, Some(&prior), 100);
        assert_eq!(t.record, None);
        assert_eq!(t.event, None);
    }

    #[test]
    fn test_false_never_notifies() {
        for prior in [
            None,
            Some(StateRecord::seen_available(10)),
            Some(StateRecord::seen_unavailable(10)),
        ] {
            let t = evaluate(&product(), false, prior.as_ref(), 100);
            assert_eq!(t.event, None);
            let record = t.record.unwrap();
            assert!(!record.available);
            assert_eq!(record.last_seen_unavailable_at, Some(100));
        }
    }

    #[test]
    fn test_true_to_false_keeps_available_stamp() {
        let prior = StateRecord::seen_available(10);
        let record = evaluate(&product(), false, Some(&prior), 100).record.unwrap();
        assert_eq!(record.last_seen_available_at, Some(10));
    }

    #[test]
    fn test_message_wording() {
        let event = evaluate(&product(), true, None, 1).event.unwrap();
        assert_eq!(
            event.message(),
            "✅ <b>¡Hay stock!</b>\n<b>Consola</b>\nhttps://shop.example/consola"
        );

        let mut discovery = product();
        discovery.category_tag = Some(DISCOVERY_TAG.into());
        let event = evaluate(&discovery, true, None, 1).event.unwrap();
        assert!(event.message().contains("¡Novedad detectada!"));
    }

    #[test]
    fn test_message_escapes_markup() {
        let mut p = product();
        p.name = "R&D <beta>".into();
        p.url = "https://shop.example/p?a=1&b=2".into();
        let message = evaluate(&p, true, None, 1).event.unwrap().message();
        assert!(message.contains("<b>R&amp;D &lt;beta&gt;</b>"));
        assert!(message.ends_with("https://shop.example/p?a=1&amp;b=2"));
    }
}
