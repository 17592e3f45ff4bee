//! Crate-wide error type and result alias.

use thiserror::Error;

/// Crate result alias.
pub type Result<T> = std::result::Result<T, BotError>;

/// Errors surfaced by the factbot core.
///
/// Logical not-found outcomes (missing user, out-of-range favorite index,
/// cache miss) are NOT errors — they are `Ok(false)` / `Ok(None)` returns.
/// `Storage` specifically means "the mutation was not durably persisted";
/// the previous on-disk document is still intact when it is returned.
#[derive(Debug, Error)]
pub enum BotError {
    /// A store mutation could not be durably persisted.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration is missing or malformed.
    #[error("Config error: {0}")]
    Config(String),

    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport failure talking to an upstream content API.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
