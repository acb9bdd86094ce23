//! Announce registry
//!
//! Bounded set of recently announced info hashes, keyed by hash, each with
//! the time it was last reported.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::clock::SharedClock;
use super::error::{HookError, HookResult, Registry};
use super::info_hash::InfoHash;
use super::schedule;

/// Unlocked state. All time-dependent methods take `now` explicitly.
#[derive(Debug, Default)]
struct Announces {
    last_seen: HashMap<InfoHash, DateTime<Utc>>,
}

impl Announces {
    fn record(&mut self, hash: InfoHash, max: usize, now: DateTime<Utc>) -> HookResult<()> {
        if let Some(seen) = self.last_seen.get_mut(&hash) {
            *seen = now;
            return Ok(());
        }
        if self.last_seen.len() + 1 > max {
            return Err(HookError::CapacityExceeded {
                registry: Registry::Announces,
                max,
            });
        }
        self.last_seen.insert(hash, now);
        Ok(())
    }

    fn collect_since(&self, threshold: DateTime<Utc>) -> Vec<InfoHash> {
        self.last_seen
            .iter()
            .filter(|(_, &seen)| schedule::seen_after(seen, threshold))
            .map(|(hash, _)| *hash)
            .collect()
    }

    fn evict_expired(&mut self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let before = self.last_seen.len();
        self.last_seen
            .retain(|_, seen| !schedule::is_expired(*seen, max_age, now));
        before - self.last_seen.len()
    }
}

pub struct AnnounceRegistry {
    inner: RwLock<Announces>,
    max_announces: usize,
    clock: SharedClock,
}

impl AnnounceRegistry {
    pub fn new(max_announces: usize, clock: SharedClock) -> Self {
        Self {
            inner: RwLock::new(Announces::default()),
            max_announces,
            clock,
        }
    }

    /// Record an announce of `hash`, refreshing it if already known.
    ///
    /// Fails with [`HookError::CapacityExceeded`] when a new hash would grow
    /// the registry past its bound.
    pub async fn record(&self, hash: InfoHash) -> HookResult<()> {
        let now = self.clock.now();
        self.inner
            .write()
            .await
            .record(hash, self.max_announces, now)
    }

    /// Hashes seen strictly after `threshold`, in no particular order.
    pub async fn collect_since(&self, threshold: DateTime<Utc>) -> Vec<InfoHash> {
        self.inner.read().await.collect_since(threshold)
    }

    /// Drop every announce not seen for more than `max_age`. Returns how many
    /// were removed.
    pub async fn evict_expired(&self, now: DateTime<Utc>, max_age: Duration) -> usize {
        self.inner.write().await.evict_expired(now, max_age)
    }

    pub async fn last_seen(&self, hash: &InfoHash) -> Option<DateTime<Utc>> {
        self.inner.read().await.last_seen.get(hash).copied()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.last_seen.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::hook::clock::{Clock, ManualClock};

    fn hash(n: u8) -> InfoHash {
        InfoHash::new([n; 20])
    }

    fn registry(max: usize) -> (AnnounceRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (AnnounceRegistry::new(max, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_record_is_idempotent() {
        let (announces, clock) = registry(10);

        announces.record(hash(1)).await.unwrap();
        clock.advance(Duration::milliseconds(10));
        announces.record(hash(1)).await.unwrap();

        assert_eq!(announces.len().await, 1);
        assert_eq!(announces.last_seen(&hash(1)).await, Some(clock.now()));
    }

    #[tokio::test]
    async fn test_record_rejects_over_capacity() {
        let (announces, _clock) = registry(2);

        announces.record(hash(1)).await.unwrap();
        announces.record(hash(2)).await.unwrap();
        let err = announces.record(hash(3)).await.unwrap_err();

        assert!(err.is_transient());
        assert_eq!(announces.len().await, 2);
        assert_eq!(announces.last_seen(&hash(3)).await, None);

        // refreshing a known hash never hits the bound
        announces.record(hash(2)).await.unwrap();
        assert_eq!(announces.len().await, 2);
    }

    #[tokio::test]
    async fn test_collect_since_is_strict_and_read_only() {
        let (announces, clock) = registry(10);
        let start = clock.now();

        announces.record(hash(1)).await.unwrap();
        clock.advance(Duration::seconds(1));
        announces.record(hash(2)).await.unwrap();

        assert_eq!(announces.collect_since(start).await, vec![hash(2)]);

        let mut all = announces
            .collect_since(start - Duration::seconds(1))
            .await;
        all.sort();
        assert_eq!(all, vec![hash(1), hash(2)]);
        assert_eq!(announces.len().await, 2);
    }

    #[tokio::test]
    async fn test_evict_expired() {
        let (announces, clock) = registry(10);
        let max_age = Duration::seconds(10);

        announces.record(hash(1)).await.unwrap();
        clock.advance(max_age + Duration::seconds(1));
        announces.record(hash(2)).await.unwrap();

        let removed = announces.evict_expired(clock.now(), max_age).await;
        assert_eq!(removed, 1);
        assert_eq!(announces.last_seen(&hash(1)).await, None);
        assert!(announces.last_seen(&hash(2)).await.is_some());
    }

    #[tokio::test]
    async fn test_refresh_postpones_expiry() {
        let (announces, clock) = registry(10);
        let max_age = Duration::seconds(10);

        announces.record(hash(1)).await.unwrap();
        clock.advance(Duration::seconds(8));
        announces.record(hash(1)).await.unwrap();
        clock.advance(Duration::seconds(8));

        assert_eq!(announces.evict_expired(clock.now(), max_age).await, 0);
        assert!(!announces.is_empty().await);
    }
}
