//! Per-user pending-content tracking.
//!
//! After the bot shows a response, the user may tap "add to favorites".
//! The association between a user and the content they just saw is held
//! here, keyed by user id, with a short staleness window so stale entries
//! can never be saved and the map cannot grow without bound.

use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

use crate::storage::Category;

/// Content the bot just showed a user, awaiting a possible favorite-save.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingContent {
    pub content: String,
    pub category: Category,
    stored_at: u64,
}

/// Bounded-lifetime map from user id to the last content shown to them.
pub struct PendingStore {
    entries: DashMap<i64, PendingContent>,
    max_age_secs: u64,
}

impl PendingStore {
    /// Create a store whose entries go stale after `max_age_secs` seconds.
    pub fn new(max_age_secs: u64) -> Self {
        Self {
            entries: DashMap::new(),
            max_age_secs,
        }
    }

    /// Remember the content just shown to `user_id`, replacing any previous
    /// association.
    pub fn remember(&self, user_id: i64, content: impl Into<String>, category: Category) {
        self.entries.insert(
            user_id,
            PendingContent {
                content: content.into(),
                category,
                stored_at: now_secs(),
            },
        );
    }

    /// Consume the pending content for `user_id`. Stale entries are dropped
    /// and reported as absent; a second `take` always returns `None`.
    pub fn take(&self, user_id: i64) -> Option<PendingContent> {
        let (_, pending) = self.entries.remove(&user_id)?;
        if now_secs().saturating_sub(pending.stored_at) > self.max_age_secs {
            return None;
        }
        Some(pending)
    }

    /// Number of users with a pending association.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remember_then_take() {
        let store = PendingStore::new(300);
        store.remember(1, "a cat fact", Category::CatFact);

        let pending = store.take(1).expect("pending content present");
        assert_eq!(pending.content, "a cat fact");
        assert_eq!(pending.category, Category::CatFact);
    }

    #[test]
    fn take_consumes_the_entry() {
        let store = PendingStore::new(300);
        store.remember(1, "x", Category::Joke);
        assert!(store.take(1).is_some());
        assert!(store.take(1).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn remember_replaces_previous_content() {
        let store = PendingStore::new(300);
        store.remember(1, "old", Category::Joke);
        store.remember(1, "new", Category::RandomFact);

        let pending = store.take(1).unwrap();
        assert_eq!(pending.content, "new");
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn stale_entry_is_dropped() {
        let store = PendingStore::new(300);
        store.remember(1, "x", Category::Joke);
        if let Some(mut entry) = store.entries.get_mut(&1) {
            entry.stored_at -= 301;
        }
        assert!(store.take(1).is_none());
        assert!(store.is_empty(), "stale entry must not linger");
    }

    #[test]
    fn users_do_not_share_pending_content() {
        let store = PendingStore::new(300);
        store.remember(1, "one", Category::Joke);
        store.remember(2, "two", Category::CatFact);

        assert_eq!(store.take(2).unwrap().content, "two");
        assert_eq!(store.take(1).unwrap().content, "one");
    }
}
