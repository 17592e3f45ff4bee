//! Short-lived response caching with lazy TTL expiry.

pub mod ttl_cache;

pub use ttl_cache::{CacheStats, TtlCache, DEFAULT_TTL_SECS};

/// Cache key construction.
///
/// Content lookups share one fixed key per category — every user sees the
/// same "most recent cat fact" while it is fresh. Prediction lookups fold
/// the input name to lowercase so `"Anna"` and `"ANNA"` share a slot.
pub mod keys {
    pub const CAT_FACT: &str = "cat_fact";
    pub const JOKE: &str = "joke";
    pub const RANDOM_FACT: &str = "random_fact";

    /// Key for a name-based prediction lookup, e.g. `age_anna`.
    pub fn prediction(kind: &str, name: &str) -> String {
        format!("{}_{}", kind, name.trim().to_lowercase())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn prediction_key_normalizes_case() {
            assert_eq!(prediction("age", "Anna"), "age_anna");
            assert_eq!(prediction("age", "ANNA"), "age_anna");
            assert_eq!(prediction("gender", "  Sam "), "gender_sam");
        }
    }
}
