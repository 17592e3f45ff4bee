//! Per-user rate limiting for incoming interactions.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Map size above which stale entries are pruned on the next interaction.
const PRUNE_THRESHOLD: usize = 1024;

/// Minimum-interval throttle keyed by user id.
///
/// An interaction is allowed when at least `interval` has passed since the
/// user's last allowed interaction. Denied interactions do not reset the
/// window. Entries older than the interval carry no deny-state, so they are
/// pruned once the map grows past [`PRUNE_THRESHOLD`].
pub struct Throttle {
    last_allowed: DashMap<i64, Instant>,
    interval: Duration,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_allowed: DashMap::new(),
            interval,
        }
    }

    /// Returns `true` and records the interaction if the user is within
    /// their rate budget.
    pub fn allow(&self, user_id: i64) -> bool {
        let now = Instant::now();
        self.prune(now);

        let mut allowed = true;
        self.last_allowed
            .entry(user_id)
            .and_modify(|last| {
                if now.duration_since(*last) < self.interval {
                    allowed = false;
                } else {
                    *last = now;
                }
            })
            .or_insert(now);
        allowed
    }

    /// Drop entries whose window has already elapsed. They would allow the
    /// next interaction anyway, so removal never changes an outcome.
    fn prune(&self, now: Instant) {
        if self.last_allowed.len() <= PRUNE_THRESHOLD {
            return;
        }
        self.last_allowed
            .retain(|_, last| now.duration_since(*last) < self.interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_interaction_is_allowed() {
        let throttle = Throttle::new(Duration::from_secs(1));
        assert!(throttle.allow(1));
    }

    #[test]
    fn rapid_repeat_is_denied() {
        let throttle = Throttle::new(Duration::from_secs(60));
        assert!(throttle.allow(1));
        assert!(!throttle.allow(1));
    }

    #[test]
    fn users_are_throttled_independently() {
        let throttle = Throttle::new(Duration::from_secs(60));
        assert!(throttle.allow(1));
        assert!(throttle.allow(2));
        assert!(!throttle.allow(1));
    }

    #[test]
    fn zero_interval_never_throttles() {
        let throttle = Throttle::new(Duration::ZERO);
        assert!(throttle.allow(1));
        assert!(throttle.allow(1));
    }

    #[test]
    fn stale_entries_are_pruned_past_threshold() {
        let throttle = Throttle::new(Duration::from_millis(10));
        let stale = Instant::now() - Duration::from_millis(20);
        for id in 0..(PRUNE_THRESHOLD as i64 + 10) {
            throttle.last_allowed.insert(id, stale);
        }

        assert!(throttle.allow(-1));
        assert!(
            throttle.last_allowed.len() <= 2,
            "expired windows must not accumulate"
        );
    }

    #[test]
    fn prune_keeps_active_windows() {
        let throttle = Throttle::new(Duration::from_secs(60));
        for id in 0..(PRUNE_THRESHOLD as i64 + 10) {
            throttle.last_allowed.insert(id, Instant::now());
        }

        assert!(!throttle.allow(5), "fresh entries survive the prune");
        assert!(throttle.last_allowed.len() > PRUNE_THRESHOLD);
    }
}
