//! Resource id generation.
//!
//! Ids look like creation timestamps (milliseconds since the epoch) but are strictly
//! increasing within the process, so two records created in the same millisecond never
//! share an id.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Monotonic id source shared by snippets, comments and files.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    /// Create a generator that never issues an id at or below `floor`.
    pub fn seeded(floor: i64) -> Self {
        Self {
            last: AtomicI64::new(floor),
        }
    }

    /// Issue the next id: the current time in milliseconds, or `last + 1` if the clock
    /// has not moved past the previous id.
    pub fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now.max(previous.saturating_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_ids_strictly_increase() {
        let ids = IdGenerator::default();
        let mut previous = ids.next_id();
        for _ in 0..1_000 {
            let id = ids.next_id();
            assert!(id > previous);
            previous = id;
        }
    }

    #[test]
    fn test_seed_from_future_timestamp() {
        let future = Utc::now().timestamp_millis() + 60_000;
        let ids = IdGenerator::seeded(future);
        assert_eq!(ids.next_id(), future + 1);
        assert_eq!(ids.next_id(), future + 2);
    }

    #[test]
    fn test_saturates_at_max_id() {
        let ids = IdGenerator::seeded(i64::MAX);
        assert_eq!(ids.next_id(), i64::MAX);
    }

    #[test]
    fn test_unique_across_threads() {
        let ids = Arc::new(IdGenerator::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..500).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 2_000);
    }
}
