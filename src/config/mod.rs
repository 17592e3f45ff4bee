//! Runtime configuration loaded from the environment.
//!
//! A `.env` file is honored via `dotenvy` before any variable is read.
//! Upstream API URLs are constants in the `api` module; everything
//! operator-tunable lives here.

use std::path::PathBuf;

use crate::cache::DEFAULT_TTL_SECS;
use crate::error::{BotError, Result};

/// Default path of the persisted user store, relative to the working dir.
pub const DEFAULT_STORAGE_PATH: &str = "storage/users.json";

/// Default minimum interval between handled interactions per user.
pub const DEFAULT_THROTTLE_MS: u64 = 1000;

/// Runtime settings for the bot process.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Telegram bot token (`FACTBOT_TOKEN`).
    pub bot_token: String,
    /// Path of the persisted user store (`FACTBOT_STORAGE`).
    pub storage_path: PathBuf,
    /// Response cache TTL in seconds (`FACTBOT_CACHE_TTL`).
    pub cache_ttl_secs: u64,
    /// Per-user throttle interval in milliseconds (`FACTBOT_THROTTLE_MS`).
    pub throttle_ms: u64,
    /// User ids allowed to run `/stats` (`FACTBOT_ADMIN_IDS`, comma-separated).
    pub admin_ids: Vec<i64>,
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// `FACTBOT_TOKEN` is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let bot_token = std::env::var("FACTBOT_TOKEN")
            .map_err(|_| BotError::Config("FACTBOT_TOKEN is not set".into()))?;
        if bot_token.trim().is_empty() {
            return Err(BotError::Config("FACTBOT_TOKEN is empty".into()));
        }

        Ok(Self {
            bot_token,
            storage_path: std::env::var("FACTBOT_STORAGE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORAGE_PATH)),
            cache_ttl_secs: env_u64("FACTBOT_CACHE_TTL", DEFAULT_TTL_SECS)?,
            throttle_ms: env_u64("FACTBOT_THROTTLE_MS", DEFAULT_THROTTLE_MS)?,
            admin_ids: parse_admin_ids(
                &std::env::var("FACTBOT_ADMIN_IDS").unwrap_or_default(),
            )?,
        })
    }

    /// Returns `true` if `user_id` may run admin-only commands.
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| BotError::Config(format!("{} must be an integer, got '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

/// Parse a comma-separated admin id list. Empty input yields an empty list.
fn parse_admin_ids(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| BotError::Config(format!("invalid admin id '{}'", s)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_admin_ids_empty() {
        assert!(parse_admin_ids("").unwrap().is_empty());
        assert!(parse_admin_ids(" , ,").unwrap().is_empty());
    }

    #[test]
    fn parse_admin_ids_list() {
        let ids = parse_admin_ids("42, 1337,7").unwrap();
        assert_eq!(ids, vec![42, 1337, 7]);
    }

    #[test]
    fn parse_admin_ids_rejects_garbage() {
        assert!(parse_admin_ids("42,abc").is_err());
    }

    #[test]
    fn is_admin_checks_allowlist() {
        let settings = Settings {
            bot_token: "t".into(),
            storage_path: PathBuf::from("storage/users.json"),
            cache_ttl_secs: DEFAULT_TTL_SECS,
            throttle_ms: DEFAULT_THROTTLE_MS,
            admin_ids: vec![99],
        };
        assert!(settings.is_admin(99));
        assert!(!settings.is_admin(100));
    }
}
