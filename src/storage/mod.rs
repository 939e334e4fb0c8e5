//! Storage abstractions for availability state.
//!
//! State is a single JSON document mapping product URL to its last known
//! availability:
//!
//! ```text
//! {
//!   "https://shop.example/consola": {
//!     "available": true,
//!     "last_seen_available": 1760870000
//!   }
//! }
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::StateMap;

// Re-export for convenience
pub use local::LocalStateStore;

/// Trait for state storage backends.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted map.
    ///
    /// Missing or unreadable state yields an empty map (cold start).
    async fn load(&self) -> StateMap;

    /// Replace the persisted map atomically.
    async fn save(&self, state: &StateMap) -> Result<()>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}
