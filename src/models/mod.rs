// src/models/mod.rs

//! Domain models for the monitor.
//!
//! This module contains the configuration, product and state structures
//! shared by the fetch, classify and transition stages.

mod config;
mod product;
mod state;

// Re-export all public types
pub use config::{
    Config, FetchConfig, KeywordDefaults, MAX_CONCURRENCY_CAP, MonitorConfig, ProductConfig,
    TelegramConfig,
};
pub use product::{DISCOVERY_TAG, Product};
pub use state::{StateMap, StateRecord};
