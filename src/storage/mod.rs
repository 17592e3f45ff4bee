//! Durable keyed storage for user profiles, favorites, history, and stats.
//!
//! The whole store is one pretty-printed JSON document replaced atomically
//! on every write. Single-writer assumption throughout: no locking, no
//! versioning, last writer wins on the whole document.

pub mod record_store;

pub use record_store::{RecordStore, StatsReport, UserPatch};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// History entries retained per user. Oldest entries are dropped first.
pub const HISTORY_CAP: usize = 50;

/// Fixed classification of a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    CatFact,
    Joke,
    RandomFact,
    Prediction,
    Other,
}

impl Category {
    /// Kebab-case tag, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CatFact => "cat-fact",
            Category::Joke => "joke",
            Category::RandomFact => "random-fact",
            Category::Prediction => "prediction",
            Category::Other => "other",
        }
    }

    /// Parse a kebab-case tag. Unknown tags map to `Other`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "cat-fact" => Category::CatFact,
            "joke" => Category::Joke,
            "random-fact" => Category::RandomFact,
            "prediction" => Category::Prediction,
            _ => Category::Other,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A saved bot response in a user's favorites list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub content: String,
    pub category: Category,
    pub added_at: DateTime<Utc>,
}

/// One entry in a user's bounded request history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Category of the action that produced this entry.
    pub command: Category,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A stored user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub favorites: Vec<FavoriteEntry>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub request_count: u64,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// A fresh record with empty favorites and history.
    pub fn new(user_id: i64, username: Option<String>, display_name: Option<String>) -> Self {
        Self {
            user_id,
            username,
            display_name,
            favorites: Vec::new(),
            history: Vec::new(),
            request_count: 0,
            created_at: Utc::now(),
        }
    }
}

/// Store-wide aggregate counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_users: u64,
    pub total_requests: u64,
    /// Store-initialization time. Set once, never updated.
    pub created_at: DateTime<Utc>,
}

impl GlobalStats {
    fn new() -> Self {
        Self {
            total_users: 0,
            total_requests: 0,
            created_at: Utc::now(),
        }
    }
}

impl Default for GlobalStats {
    fn default() -> Self {
        Self::new()
    }
}
