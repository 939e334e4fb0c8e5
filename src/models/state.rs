//! Persisted availability state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Last known availability of one product URL.
///
/// Timestamps are Unix epoch seconds. Field names on disk match the state
/// files written by earlier deployments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StateRecord {
    pub available: bool,

    #[serde(
        default,
        rename = "last_seen_available",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_seen_available_at: Option<i64>,

    #[serde(
        default,
        rename = "last_seen_unavailable",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_seen_unavailable_at: Option<i64>,
}

impl StateRecord {
    /// Record observed available at `now`.
    pub fn seen_available(now: i64) -> Self {
        Self {
            available: true,
            last_seen_available_at: Some(now),
            last_seen_unavailable_at: None,
        }
    }

    /// Record observed unavailable at `now`.
    pub fn seen_unavailable(now: i64) -> Self {
        Self {
            available: false,
            last_seen_available_at: None,
            last_seen_unavailable_at: Some(now),
        }
    }
}

/// URL → last known state. Ordered so the file diff stays stable between runs.
pub type StateMap = BTreeMap<String, StateRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_legacy_field_names() {
        let json = serde_json::to_value(StateRecord::seen_available(1_700_000_000)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"available": true, "last_seen_available": 1_700_000_000})
        );
    }

    #[test]
    fn reads_record_without_timestamps() {
        let record: StateRecord = serde_json::from_str(r#"{"available": false}"#).unwrap();
        assert_eq!(record, StateRecord::default());
    }
}
