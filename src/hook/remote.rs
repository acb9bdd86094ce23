//! Remote registry
//!
//! Subscribers ("remotes") in registration order, with their push cadence and
//! failure bookkeeping.

use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use tokio::sync::{RwLock, RwLockWriteGuard};

use super::clock::SharedClock;
use super::error::{HookError, HookResult, Registry, ValidationError};
use super::schedule;

/// Snapshot of one subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    pub address: String,
    pub interval: Duration,
    pub last_call_at: Option<DateTime<Utc>>,
    pub failure_count: u32,
    pub on_hold_since: Option<DateTime<Utc>>,
}

impl Remote {
    fn new(address: String, interval: Duration) -> Self {
        Self {
            address,
            interval,
            last_call_at: None,
            failure_count: 0,
            on_hold_since: None,
        }
    }

    pub fn is_on_hold(&self) -> bool {
        self.on_hold_since.is_some()
    }
}

/// Admission limits for [`RemoteRegistry::subscribe`].
#[derive(Debug, Clone, Copy)]
pub struct RemoteLimits {
    pub max_remotes: usize,
    pub min_interval: Duration,
}

fn validate_address(address: &str) -> Result<(), ValidationError> {
    Url::parse(address)
        .map(|_| ())
        .map_err(|e| ValidationError::MalformedAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

#[derive(Debug, Default)]
struct Remotes {
    entries: Vec<Remote>,
}

impl Remotes {
    fn find_mut(&mut self, address: &str) -> Option<&mut Remote> {
        self.entries.iter_mut().find(|r| r.address == address)
    }

    fn subscribe(
        &mut self,
        address: &str,
        interval: Duration,
        limits: RemoteLimits,
    ) -> HookResult<()> {
        validate_address(address)?;
        if interval < limits.min_interval {
            return Err(ValidationError::IntervalTooShort {
                interval_secs: interval.num_seconds(),
                min_secs: limits.min_interval.num_seconds(),
            }
            .into());
        }
        if let Some(remote) = self.find_mut(address) {
            remote.interval = interval;
            remote.on_hold_since = None;
            remote.failure_count = 0;
            return Ok(());
        }
        if self.entries.len() + 1 > limits.max_remotes {
            return Err(HookError::CapacityExceeded {
                registry: Registry::Remotes,
                max: limits.max_remotes,
            });
        }
        self.entries.push(Remote::new(address.to_string(), interval));
        Ok(())
    }

    fn active(&self) -> Vec<Remote> {
        self.entries
            .iter()
            .filter(|r| !r.is_on_hold())
            .cloned()
            .collect()
    }

    fn record_success(&mut self, address: &str, now: DateTime<Utc>) {
        if let Some(remote) = self.find_mut(address) {
            remote.last_call_at = Some(now);
            remote.failure_count = 0;
        }
    }

    fn record_failure(&mut self, address: &str, max_failures: u32, now: DateTime<Utc>) -> bool {
        let Some(remote) = self.find_mut(address) else {
            return false;
        };
        remote.failure_count = remote.failure_count.saturating_add(1);
        if remote.failure_count > max_failures {
            let was_active = remote.on_hold_since.is_none();
            remote.on_hold_since = Some(now);
            return was_active;
        }
        false
    }

    fn evict_on_hold(&mut self, now: DateTime<Utc>, max_timeout: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|r| match r.on_hold_since {
            Some(since) => !schedule::is_evictable(since, max_timeout, now),
            None => true,
        });
        before - self.entries.len()
    }
}

pub struct RemoteRegistry {
    inner: RwLock<Remotes>,
    limits: RemoteLimits,
    clock: SharedClock,
}

impl RemoteRegistry {
    pub fn new(limits: RemoteLimits, clock: SharedClock) -> Self {
        Self {
            inner: RwLock::new(Remotes::default()),
            limits,
            clock,
        }
    }

    /// Subscribe `address` to be notified every `interval`.
    ///
    /// Re-subscribing a known address updates its interval and takes it off
    /// hold; it never fails on capacity.
    pub async fn subscribe(&self, address: &str, interval: Duration) -> HookResult<()> {
        self.inner
            .write()
            .await
            .subscribe(address, interval, self.limits)
    }

    /// Remotes not on hold, in registration order.
    pub async fn list_active(&self) -> Vec<Remote> {
        self.inner.read().await.active()
    }

    pub async fn record_success(&self, address: &str) {
        let now = self.clock.now();
        self.inner.write().await.record_success(address, now);
    }

    /// Count a failed delivery. Past `max_failures` the hold timestamp is set
    /// to now, even for a remote already on hold. Returns true when this
    /// failure took an active remote off the dispatch list.
    pub async fn record_failure(&self, address: &str, max_failures: u32) -> bool {
        let now = self.clock.now();
        self.inner
            .write()
            .await
            .record_failure(address, max_failures, now)
    }

    pub async fn evict_on_hold(&self, now: DateTime<Utc>, max_timeout: Duration) -> usize {
        self.inner.write().await.evict_on_hold(now, max_timeout)
    }

    pub async fn get(&self, address: &str) -> Option<Remote> {
        self.inner
            .read()
            .await
            .entries
            .iter()
            .find(|r| r.address == address)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Lock the registry for a whole dispatch pass.
    ///
    /// Subscriptions wait until the pass is dropped.
    pub async fn pass(&self) -> DispatchPass<'_> {
        DispatchPass {
            remotes: self.inner.write().await,
            clock: &self.clock,
        }
    }
}

/// Exclusive access to the remotes for the duration of one tick.
pub struct DispatchPass<'a> {
    remotes: RwLockWriteGuard<'a, Remotes>,
    clock: &'a SharedClock,
}

impl DispatchPass<'_> {
    pub fn active(&self) -> Vec<Remote> {
        self.remotes.active()
    }

    pub fn record_success(&mut self, address: &str) {
        let now = self.clock.now();
        self.remotes.record_success(address, now);
    }

    pub fn record_failure(&mut self, address: &str, max_failures: u32) -> bool {
        let now = self.clock.now();
        self.remotes.record_failure(address, max_failures, now)
    }

    pub fn evict_on_hold(&mut self, now: DateTime<Utc>, max_timeout: Duration) -> usize {
        self.remotes.evict_on_hold(now, max_timeout)
    }
}
