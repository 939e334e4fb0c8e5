// src/config.rs

//! Configuration loading utilities.
//!
//! This module resolves the config file and the messaging credentials,
//! where environment variables take precedence over the file.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{Config, TelegramConfig};

/// Environment variable holding the bot token.
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
/// Environment variable holding the destination chat id.
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

/// Messaging API credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl Credentials {
    /// Resolve credentials from the process environment, then the config file.
    pub fn resolve(telegram: &TelegramConfig) -> Result<Self> {
        Self::resolve_with(telegram, |key| std::env::var(key).ok())
    }

    /// Resolve credentials using `lookup` for environment access.
    ///
    /// Empty values count as missing.
    pub fn resolve_with<F>(telegram: &TelegramConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, file_value: &Option<String>| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file_value.clone().filter(|v| !v.trim().is_empty()))
        };

        let bot_token = pick(ENV_BOT_TOKEN, &telegram.bot_token);
        let chat_id = pick(ENV_CHAT_ID, &telegram.chat_id);

        match (bot_token, chat_id) {
            (Some(bot_token), Some(chat_id)) => Ok(Self { bot_token, chat_id }),
            _ => Err(AppError::config(format!(
                "missing {ENV_BOT_TOKEN} or {ENV_CHAT_ID} (env or [telegram] in config)"
            ))),
        }
    }
}

/// Load and validate the config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Load config and credentials, failing before any network activity.
pub fn load_all(path: &Path) -> Result<(Config, Credentials)> {
    let config = load_config(path)?;
    let credentials = Credentials::resolve(&config.telegram)?;
    Ok((config, credentials))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telegram(token: Option<&str>, chat: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(String::from),
            chat_id: chat.map(String::from),
            ..TelegramConfig::default()
        }
    }

    #[test]
    fn env_takes_precedence_over_file() {
        let creds = Credentials::resolve_with(&telegram(Some("file"), Some("1")), |key| {
            (key == ENV_BOT_TOKEN).then(|| "env".to_string())
        })
        .unwrap();
        assert_eq!(creds.bot_token, "env");
        assert_eq!(creds.chat_id, "1");
    }

    #[test]
    fn falls_back_to_file() {
        let creds =
            Credentials::resolve_with(&telegram(Some("file"), Some("1")), |_| None).unwrap();
        assert_eq!(creds.bot_token, "file");
    }

    #[test]
    fn empty_env_value_counts_as_missing() {
        let creds = Credentials::resolve_with(&telegram(Some("file"), Some("1")), |_| {
            Some("  ".to_string())
        })
        .unwrap();
        assert_eq!(creds.bot_token, "file");
    }

    #[test]
    fn missing_credentials_is_config_error() {
        let err = Credentials::resolve_with(&telegram(Some("file"), None), |_| None).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn debug_output_redacts_token() {
        let creds = Credentials {
            bot_token: "secret".into(),
            chat_id: "1".into(),
        };
        assert!(!format!("{creds:?}").contains("secret"));
    }
}
