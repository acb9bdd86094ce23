//! Announce relay core
//!
//! [`Hook`] owns the two registries. Upstream code feeds it announces with
//! [`Hook::record`], the subscription transport calls [`Hook::subscribe`],
//! and a [`Dispatcher`] built from it pushes batches to the remotes on every
//! tick.

pub mod announce;
pub mod clock;
pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod info_hash;
pub mod remote;
pub mod schedule;

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;

pub use announce::AnnounceRegistry;
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use delivery::{HttpNotifier, Notifier};
pub use dispatcher::{Dispatcher, TickReport};
pub use error::{DeliveryError, HookError, HookResult, Registry, ValidationError};
pub use info_hash::InfoHash;
pub use remote::{Remote, RemoteLimits, RemoteRegistry};

/// Limits and timeouts of the relay core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookConfig {
    /// Hold window used by the on-hold eviction sweep.
    pub remote_on_hold_max_timeout: Duration,
    /// Consecutive failures tolerated before a remote is put on hold.
    pub max_failures: u32,
    pub max_remotes: usize,
    pub min_remote_interval: Duration,
    /// Announces not seen for longer than this are dropped.
    pub announce_max_timeout: Duration,
    pub max_announces: usize,
    pub tick_period: std::time::Duration,
    pub delivery_timeout: std::time::Duration,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            remote_on_hold_max_timeout: Duration::days(3),
            max_failures: 5,
            max_remotes: 1,
            min_remote_interval: Duration::hours(1),
            announce_max_timeout: Duration::days(10),
            max_announces: 10_000_000,
            tick_period: std::time::Duration::from_secs(1),
            delivery_timeout: std::time::Duration::from_secs(5),
        }
    }
}

/// Registry sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Status {
    pub remotes: usize,
    pub announces: usize,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "remotes {}", self.remotes)?;
        writeln!(f, "announces {}", self.announces)
    }
}

pub struct Hook {
    announces: Arc<AnnounceRegistry>,
    remotes: Arc<RemoteRegistry>,
    clock: SharedClock,
    config: HookConfig,
}

impl Hook {
    pub fn new(config: HookConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: HookConfig, clock: SharedClock) -> Self {
        let limits = RemoteLimits {
            max_remotes: config.max_remotes,
            min_interval: config.min_remote_interval,
        };
        Self {
            announces: Arc::new(AnnounceRegistry::new(config.max_announces, clock.clone())),
            remotes: Arc::new(RemoteRegistry::new(limits, clock.clone())),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    /// Record an announce. A capacity error means "try again later".
    pub async fn record(&self, hash: InfoHash) -> HookResult<()> {
        metrics::increment_counter!("dha_announces_received_total");
        self.announces.record(hash).await
    }

    pub async fn subscribe(&self, address: &str, interval: Duration) -> HookResult<()> {
        self.remotes.subscribe(address, interval).await?;
        tracing::info!(address = %address, interval_secs = interval.num_seconds(), "remote subscribed");
        Ok(())
    }

    /// Sizes of both registries. Each is read under its own lock, so the pair
    /// is not an atomic snapshot.
    pub async fn status(&self) -> Status {
        Status {
            remotes: self.remotes.len().await,
            announces: self.announces.len().await,
        }
    }

    /// Write the text form of [`Hook::status`].
    pub async fn write_status<W: std::io::Write>(&self, mut w: W) -> std::io::Result<()> {
        let status = self.status().await;
        write!(w, "{}", status)
    }

    pub fn announces(&self) -> &AnnounceRegistry {
        &self.announces
    }

    pub fn remotes(&self) -> &RemoteRegistry {
        &self.remotes
    }

    /// Build a dispatcher sharing this hook's registries.
    pub fn dispatcher<N: Notifier>(&self, notifier: N) -> Dispatcher<N> {
        Dispatcher::new(
            self.announces.clone(),
            self.remotes.clone(),
            notifier,
            self.clock.clone(),
            &self.config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_text() {
        let hook = Hook::new(HookConfig {
            min_remote_interval: Duration::seconds(1),
            ..HookConfig::default()
        });
        hook.subscribe("http://localhost/notify", Duration::seconds(1))
            .await
            .unwrap();
        hook.record(InfoHash::new([1; 20])).await.unwrap();
        hook.record(InfoHash::new([2; 20])).await.unwrap();

        assert_eq!(
            hook.status().await,
            Status {
                remotes: 1,
                announces: 2
            }
        );

        let mut out = Vec::new();
        hook.write_status(&mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "remotes 1\nannounces 2\n");
    }

    #[test]
    fn test_default_config() {
        let config = HookConfig::default();
        assert_eq!(config.max_failures, 5);
        assert_eq!(config.max_remotes, 1);
        assert_eq!(config.min_remote_interval, Duration::hours(1));
        assert_eq!(config.announce_max_timeout, Duration::days(10));
        assert_eq!(config.max_announces, 10_000_000);
    }
}
