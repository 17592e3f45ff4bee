//! JSON-file record store with atomic replace-on-write.
//!
//! Every mutation is read-entire-document, modify in memory, write to a
//! `.tmp` sibling, then rename over the canonical path. A failed write
//! removes the temp artifact and surfaces `BotError::Storage`; the previous
//! document is never touched. A missing, empty, or unparseable document is
//! reset to a fresh empty store on read — availability over durability.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{BotError, Result};

use super::{Category, FavoriteEntry, GlobalStats, HistoryEntry, UserRecord, HISTORY_CAP};

/// The persisted document: all users keyed by stringified id, plus counters.
#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    users: BTreeMap<String, UserRecord>,
    stats: GlobalStats,
}

impl StoreDocument {
    fn empty() -> Self {
        Self {
            users: BTreeMap::new(),
            stats: GlobalStats::default(),
        }
    }
}

/// Partial update applied to an existing [`UserRecord`].
///
/// Merge is shallow: each present field replaces the stored one wholesale
/// (a new favorites list replaces the old list, it is not appended).
#[derive(Debug, Default, Clone)]
pub struct UserPatch {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub favorites: Option<Vec<FavoriteEntry>>,
    pub history: Option<Vec<HistoryEntry>>,
    pub request_count: Option<u64>,
}

/// Persisted counters plus metrics derived over all users at call time.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsReport {
    pub total_users: u64,
    pub total_requests: u64,
    pub created_at: DateTime<Utc>,
    /// Users with `request_count > 0`.
    pub active_users: usize,
    /// Favorites summed across all users.
    pub total_favorites: usize,
}

/// Durable single-writer store for user records and global stats.
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Open a store backed by the document at `path`.
    ///
    /// Does not touch the filesystem; the document is created on first
    /// access if it does not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Recreate the backing document with an empty user map and fresh
    /// [`GlobalStats`]. Discards any existing content.
    pub fn initialize(&self) -> Result<()> {
        self.persist(&StoreDocument::empty())?;
        info!(path = %self.path.display(), "User store initialized");
        Ok(())
    }

    /// Look up a user by exact id. No side effects.
    pub fn get_user(&self, user_id: i64) -> Option<UserRecord> {
        self.load_document().users.get(&user_id.to_string()).cloned()
    }

    /// Create a user record with empty favorites and history.
    ///
    /// If a record with the same id already exists it is returned unchanged
    /// and `total_users` is not incremented.
    pub fn create_user(
        &self,
        user_id: i64,
        username: Option<String>,
        display_name: Option<String>,
    ) -> Result<UserRecord> {
        let mut doc = self.load_document();
        let key = user_id.to_string();
        if let Some(existing) = doc.users.get(&key) {
            debug!(user_id, "create_user: record already exists");
            return Ok(existing.clone());
        }

        let record = UserRecord::new(user_id, username, display_name);
        doc.users.insert(key, record.clone());
        doc.stats.total_users += 1;
        self.persist(&doc)?;
        info!(user_id, "User created");
        Ok(record)
    }

    /// Shallow-merge `patch` into an existing record and persist.
    ///
    /// Returns `Ok(false)` if the user does not exist.
    pub fn update_user(&self, user_id: i64, patch: UserPatch) -> Result<bool> {
        let mut doc = self.load_document();
        let Some(user) = doc.users.get_mut(&user_id.to_string()) else {
            return Ok(false);
        };

        if let Some(username) = patch.username {
            user.username = Some(username);
        }
        if let Some(display_name) = patch.display_name {
            user.display_name = Some(display_name);
        }
        if let Some(favorites) = patch.favorites {
            user.favorites = favorites;
        }
        if let Some(history) = patch.history {
            user.history = history;
        }
        if let Some(request_count) = patch.request_count {
            user.request_count = request_count;
        }

        self.persist(&doc)?;
        debug!(user_id, "User updated");
        Ok(true)
    }

    /// Append a timestamped favorite to the user's list.
    ///
    /// Returns `Ok(false)` if the user does not exist.
    pub fn add_favorite(&self, user_id: i64, content: &str, category: Category) -> Result<bool> {
        let mut doc = self.load_document();
        let Some(user) = doc.users.get_mut(&user_id.to_string()) else {
            return Ok(false);
        };

        user.favorites.push(FavoriteEntry {
            content: content.to_string(),
            category,
            added_at: Utc::now(),
        });
        self.persist(&doc)?;
        debug!(user_id, %category, "Favorite added");
        Ok(true)
    }

    /// Remove and return the favorite at a zero-based `index`.
    ///
    /// Returns `Ok(None)` on an out-of-range index or missing user, with no
    /// mutation at all.
    pub fn remove_favorite(&self, user_id: i64, index: usize) -> Result<Option<FavoriteEntry>> {
        let mut doc = self.load_document();
        let Some(user) = doc.users.get_mut(&user_id.to_string()) else {
            return Ok(None);
        };
        if index >= user.favorites.len() {
            return Ok(None);
        }

        let removed = user.favorites.remove(index);
        self.persist(&doc)?;
        debug!(user_id, index, "Favorite removed");
        Ok(Some(removed))
    }

    /// Append a history entry, enforcing the [`HISTORY_CAP`], and bump both
    /// the per-user `request_count` and the global `total_requests`.
    ///
    /// The user update and the global counter land in one atomic document
    /// write. Returns `Ok(false)` if the user does not exist.
    pub fn add_history(&self, user_id: i64, command: Category, content: &str) -> Result<bool> {
        let mut doc = self.load_document();
        let Some(user) = doc.users.get_mut(&user_id.to_string()) else {
            return Ok(false);
        };

        user.history.push(HistoryEntry {
            command,
            content: content.to_string(),
            timestamp: Utc::now(),
        });
        if user.history.len() > HISTORY_CAP {
            let excess = user.history.len() - HISTORY_CAP;
            user.history.drain(..excess);
        }
        user.request_count += 1;
        doc.stats.total_requests += 1;

        self.persist(&doc)?;
        debug!(user_id, %command, "History recorded");
        Ok(true)
    }

    /// Persisted counters plus derived metrics computed over all users.
    pub fn get_stats(&self) -> StatsReport {
        let doc = self.load_document();
        StatsReport {
            total_users: doc.stats.total_users,
            total_requests: doc.stats.total_requests,
            created_at: doc.stats.created_at,
            active_users: doc.users.values().filter(|u| u.request_count > 0).count(),
            total_favorites: doc.users.values().map(|u| u.favorites.len()).sum(),
        }
    }

    /// Full scan of every stored user record.
    pub fn list_all_users(&self) -> Vec<UserRecord> {
        self.load_document().users.into_values().collect()
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    /// Read the whole document, resetting to an empty store when the file is
    /// missing, empty, or unparseable. The read path never errors.
    fn load_document(&self) -> StoreDocument {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => {
                warn!(path = %self.path.display(), "User store file is empty, reinitializing");
                self.reset_document()
            }
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        "User store is corrupt, resetting to empty: {}", e
                    );
                    self.reset_document()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.reset_document(),
            Err(e) => {
                // A transient read failure is not corruption: serve an empty
                // view but leave whatever is on disk alone.
                warn!(
                    path = %self.path.display(),
                    "Failed to read user store, proceeding with empty view: {}", e
                );
                StoreDocument::empty()
            }
        }
    }

    /// Build a fresh empty document and persist it best-effort. A persist
    /// failure here is logged, not raised; callers on the read path still
    /// get a usable empty store.
    fn reset_document(&self) -> StoreDocument {
        let doc = StoreDocument::empty();
        if let Err(e) = self.persist(&doc) {
            warn!("Failed to initialize user store: {}", e);
        } else {
            info!(path = %self.path.display(), "User store initialized");
        }
        doc
    }

    /// Atomic replace-on-write: serialize to `<path>.tmp`, then rename over
    /// the canonical path. A failure at any step removes the temp artifact
    /// and leaves the previous document intact.
    fn persist(&self, doc: &StoreDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = tmp_path(&self.path);
        let json = serde_json::to_string_pretty(doc)?;
        if let Err(e) = fs::write(&tmp, json) {
            let _ = fs::remove_file(&tmp);
            return Err(BotError::Storage(format!(
                "failed to write {}: {}",
                tmp.display(),
                e
            )));
        }
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(BotError::Storage(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e
            )));
        }
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, RecordStore) {
        let tmp = TempDir::new().unwrap();
        let store = RecordStore::new(tmp.path().join("users.json"));
        (tmp, store)
    }

    #[test]
    fn create_and_get_user() {
        let (_tmp, store) = test_store();
        let created = store
            .create_user(42, Some("alice".into()), Some("Alice".into()))
            .unwrap();
        assert_eq!(created.user_id, 42);
        assert!(created.favorites.is_empty());
        assert!(created.history.is_empty());
        assert_eq!(created.request_count, 0);

        let loaded = store.get_user(42).expect("user should exist");
        assert_eq!(loaded, created);
    }

    #[test]
    fn get_missing_user_returns_none() {
        let (_tmp, store) = test_store();
        assert!(store.get_user(7).is_none());
    }

    #[test]
    fn duplicate_create_keeps_record_and_counter() {
        let (_tmp, store) = test_store();
        store.create_user(1, Some("bob".into()), None).unwrap();
        store.add_favorite(1, "keep me", Category::Joke).unwrap();

        let again = store.create_user(1, Some("robert".into()), None).unwrap();
        assert_eq!(again.username.as_deref(), Some("bob"));
        assert_eq!(again.favorites.len(), 1, "existing record must survive");
        assert_eq!(store.get_stats().total_users, 1, "no double counting");
    }

    #[test]
    fn update_missing_user_returns_false() {
        let (_tmp, store) = test_store();
        let patch = UserPatch {
            username: Some("ghost".into()),
            ..UserPatch::default()
        };
        assert!(!store.update_user(99, patch).unwrap());
    }

    #[test]
    fn update_replaces_fields_wholesale() {
        let (_tmp, store) = test_store();
        store.create_user(1, None, None).unwrap();
        store.add_favorite(1, "a", Category::CatFact).unwrap();
        store.add_favorite(1, "b", Category::CatFact).unwrap();

        let updated = store
            .update_user(
                1,
                UserPatch {
                    favorites: Some(Vec::new()),
                    display_name: Some("New Name".into()),
                    ..UserPatch::default()
                },
            )
            .unwrap();
        assert!(updated);

        let user = store.get_user(1).unwrap();
        assert!(user.favorites.is_empty(), "new list replaces, not appends");
        assert_eq!(user.display_name.as_deref(), Some("New Name"));
    }

    #[test]
    fn favorite_removal_returns_entry_and_preserves_rest() {
        let (_tmp, store) = test_store();
        store.create_user(1, None, None).unwrap();
        for content in ["a", "b", "c"] {
            store.add_favorite(1, content, Category::Joke).unwrap();
        }

        let removed = store.remove_favorite(1, 1).unwrap().expect("index 1 valid");
        assert_eq!(removed.content, "b");

        let left: Vec<String> = store
            .get_user(1)
            .unwrap()
            .favorites
            .into_iter()
            .map(|f| f.content)
            .collect();
        assert_eq!(left, vec!["a", "c"]);
    }

    #[test]
    fn favorite_removal_out_of_range_is_untouched() {
        let (_tmp, store) = test_store();
        store.create_user(1, None, None).unwrap();
        for content in ["a", "b", "c"] {
            store.add_favorite(1, content, Category::Joke).unwrap();
        }

        assert!(store.remove_favorite(1, 5).unwrap().is_none());
        assert!(store.remove_favorite(99, 0).unwrap().is_none());
        assert_eq!(store.get_user(1).unwrap().favorites.len(), 3);
    }

    #[test]
    fn add_favorite_missing_user_returns_false() {
        let (_tmp, store) = test_store();
        assert!(!store.add_favorite(5, "x", Category::Other).unwrap());
    }

    #[test]
    fn history_capped_at_fifty_most_recent() {
        let (_tmp, store) = test_store();
        store.create_user(1, None, None).unwrap();
        for i in 0..60 {
            store
                .add_history(1, Category::RandomFact, &format!("fact {i}"))
                .unwrap();
        }

        let user = store.get_user(1).unwrap();
        assert_eq!(user.history.len(), HISTORY_CAP);
        assert_eq!(user.history.first().unwrap().content, "fact 10");
        assert_eq!(user.history.last().unwrap().content, "fact 59");
        assert_eq!(user.request_count, 60, "count keeps growing past the cap");
    }

    #[test]
    fn history_below_cap_keeps_everything() {
        let (_tmp, store) = test_store();
        store.create_user(1, None, None).unwrap();
        for i in 0..5 {
            store
                .add_history(1, Category::Joke, &format!("joke {i}"))
                .unwrap();
        }
        assert_eq!(store.get_user(1).unwrap().history.len(), 5);
    }

    #[test]
    fn stats_count_users_and_requests() {
        let (_tmp, store) = test_store();
        for id in [1, 2, 3] {
            store.create_user(id, None, None).unwrap();
        }
        store.add_history(1, Category::CatFact, "a").unwrap();
        store.add_history(1, Category::Joke, "b").unwrap();
        store.add_history(2, Category::CatFact, "c").unwrap();
        store.add_history(2, Category::RandomFact, "d").unwrap();
        store.add_history(3, Category::Joke, "e").unwrap();
        store.add_favorite(1, "fav", Category::CatFact).unwrap();

        let stats = store.get_stats();
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.total_requests, 5);
        assert_eq!(stats.active_users, 3);
        assert_eq!(stats.total_favorites, 1);
    }

    #[test]
    fn stats_active_users_excludes_idle() {
        let (_tmp, store) = test_store();
        store.create_user(1, None, None).unwrap();
        store.create_user(2, None, None).unwrap();
        store.add_history(1, Category::Joke, "x").unwrap();

        assert_eq!(store.get_stats().active_users, 1);
    }

    #[test]
    fn reload_round_trips_record_exactly() {
        let (tmp, store) = test_store();
        store
            .create_user(42, Some("alice".into()), Some("Alice".into()))
            .unwrap();
        store.add_favorite(42, "fav one", Category::Prediction).unwrap();
        store.add_history(42, Category::CatFact, "a cat fact").unwrap();
        let written = store.get_user(42).unwrap();

        // Fresh handle over the same document.
        let reopened = RecordStore::new(tmp.path().join("users.json"));
        let reloaded = reopened.get_user(42).unwrap();
        assert_eq!(reloaded, written);
    }

    #[test]
    fn corrupt_document_recovers_as_empty() {
        let (tmp, store) = test_store();
        store.create_user(1, None, None).unwrap();

        std::fs::write(tmp.path().join("users.json"), "{not valid json!").unwrap();
        assert!(store.get_user(1).is_none(), "reset, not raised");

        // Store is fully usable again after the reset.
        store.create_user(2, None, None).unwrap();
        assert!(store.get_user(2).is_some());
        assert_eq!(store.get_stats().total_users, 1);
    }

    #[test]
    fn empty_document_recovers_as_empty() {
        let (tmp, store) = test_store();
        store.create_user(1, None, None).unwrap();

        std::fs::write(tmp.path().join("users.json"), "   ").unwrap();
        assert!(store.get_user(1).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn transient_read_error_serves_empty_view_without_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("users.json");
        // A self-referential symlink reads as ELOOP, not NotFound.
        std::os::unix::fs::symlink(&path, &path).unwrap();

        let store = RecordStore::new(&path);
        assert!(store.get_user(1).is_none(), "empty view, not an error");
        assert!(
            std::fs::symlink_metadata(&path).unwrap().file_type().is_symlink(),
            "unreadable document must not be replaced"
        );
    }

    #[test]
    fn initialize_discards_existing_content() {
        let (_tmp, store) = test_store();
        store.create_user(1, None, None).unwrap();
        store.initialize().unwrap();

        assert!(store.get_user(1).is_none());
        assert_eq!(store.get_stats().total_users, 0);
    }

    #[test]
    fn failed_persist_cleans_temp_and_keeps_old_document() {
        let tmp = TempDir::new().unwrap();
        let good = RecordStore::new(tmp.path().join("users.json"));
        good.create_user(1, None, None).unwrap();

        // A directory at the canonical path makes the final rename fail.
        let blocked_path = tmp.path().join("blocked");
        std::fs::create_dir(&blocked_path).unwrap();
        let blocked = RecordStore::new(&blocked_path);
        let err = blocked.create_user(2, None, None);
        assert!(matches!(err, Err(BotError::Storage(_))));
        assert!(
            !tmp_path(&blocked_path).exists(),
            "temp artifact must be removed on failure"
        );

        // The unrelated good document is still readable.
        assert!(good.get_user(1).is_some());
    }

    #[test]
    fn list_all_users_full_scan() {
        let (_tmp, store) = test_store();
        for id in [3, 1, 2] {
            store.create_user(id, None, None).unwrap();
        }
        let mut ids: Vec<i64> = store.list_all_users().into_iter().map(|u| u.user_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn document_is_pretty_printed_json() {
        let (tmp, store) = test_store();
        store.create_user(1, None, None).unwrap();
        let raw = std::fs::read_to_string(tmp.path().join("users.json")).unwrap();
        assert!(raw.contains("\n  "), "document should be indented");
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(parsed.get("users").is_some());
        assert!(parsed.get("stats").is_some());
    }
}
