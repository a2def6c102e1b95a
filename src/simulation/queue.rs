//! Ordered set of pending collision times.
//!
//! The scheduler needs more than a plain priority queue: invalidation removes
//! *interior* times, inserts of an already-present time must be no-ops, and
//! pop must always return the smallest remaining time. A `BTreeSet` over a
//! total-order key gives all four operations directly.

use std::collections::BTreeSet;

/// Total-order key for a simulation time.
///
/// Times are offsets from the start of a tick, so they are always finite and
/// non-negative; for that range the IEEE-754 bit pattern of an `f64` orders
/// identically to its value, which makes the key usable in ordered and hashed
/// collections while staying bit-exact for map lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeKey(u64);

impl TimeKey {
    pub fn new(time: f64) -> Self {
        debug_assert!(time.is_finite() && time >= 0.0, "invalid event time {time}");
        Self(time.to_bits())
    }

    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

/// Ordered collection of distinct pending times.
#[derive(Debug, Default)]
pub struct TimeQueue {
    times: BTreeSet<TimeKey>,
}

impl TimeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a time; inserting an already-present time is a no-op.
    pub fn insert(&mut self, time: TimeKey) {
        self.times.insert(time);
    }

    /// Remove and return the smallest held time, if any.
    pub fn pop_min(&mut self) -> Option<TimeKey> {
        self.times.pop_first()
    }

    /// Remove a specific time if present; returns whether it was held.
    pub fn remove(&mut self, time: TimeKey) -> bool {
        self.times.remove(&time)
    }

    pub fn clear(&mut self) {
        self.times.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_order_matches_value_order() {
        assert!(TimeKey::new(0.0) < TimeKey::new(1e-12));
        assert!(TimeKey::new(0.5) < TimeKey::new(0.50000001));
        assert!(TimeKey::new(2.0) < TimeKey::new(10.0));
    }

    #[test]
    fn insert_is_idempotent_and_pop_is_ordered() {
        let mut q = TimeQueue::new();
        q.insert(TimeKey::new(3.0));
        q.insert(TimeKey::new(1.0));
        q.insert(TimeKey::new(2.0));
        q.insert(TimeKey::new(1.0)); // duplicate
        assert_eq!(q.len(), 3);

        assert_eq!(q.pop_min().map(TimeKey::value), Some(1.0));
        assert_eq!(q.pop_min().map(TimeKey::value), Some(2.0));
        assert_eq!(q.pop_min().map(TimeKey::value), Some(3.0));
        assert_eq!(q.pop_min(), None);
    }

    #[test]
    fn interior_removal() {
        let mut q = TimeQueue::new();
        for t in [0.25, 0.5, 0.75] {
            q.insert(TimeKey::new(t));
        }
        assert!(q.remove(TimeKey::new(0.5)));
        assert!(!q.remove(TimeKey::new(0.5))); // gone already
        assert_eq!(q.pop_min().map(TimeKey::value), Some(0.25));
        assert_eq!(q.pop_min().map(TimeKey::value), Some(0.75));
        assert!(q.is_empty());
    }
}
