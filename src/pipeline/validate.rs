// src/pipeline/validate.rs

use std::path::Path;

use crate::config::{Credentials, load_config};
use crate::error::Result;
use crate::models::Config;

/// Validate configuration and report what a run would use.
///
/// Missing credentials are reported but don't fail validation; `run` does.
pub fn run_validate(config_path: &Path) -> Result<Config> {
    match load_config(config_path) {
        Ok(config) => {
            log::info!("✓ Config OK: {}", config_path.display());
            log::info!("    Products: {}", config.products.len());
            log::info!("    Timeout: {}s", config.fetch.timeout_secs);
            log::info!(
                "    Retries: {} (backoff factor {}s)",
                config.fetch.max_retries,
                config.fetch.backoff_factor_secs
            );
            log::info!("    Max concurrent: {}", config.monitor.max_concurrent);
            log::info!("    State file: {}", config.monitor.state_file);

            match Credentials::resolve(&config.telegram) {
                Ok(creds) => log::info!("✓ Credentials found (chat {})", creds.chat_id),
                Err(e) => log::warn!("{}", e),
            }
            Ok(config)
        }
        Err(e) => {
            log::error!("Config validation failed: {}", e);
            Err(e)
        }
    }
}
