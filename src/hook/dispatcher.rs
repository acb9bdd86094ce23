//! Periodic reconciliation between announces and remotes.

use std::sync::Arc;

use chrono::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::announce::AnnounceRegistry;
use super::clock::SharedClock;
use super::delivery::Notifier;
use super::remote::RemoteRegistry;
use super::schedule;
use super::HookConfig;

/// What a single tick did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub delivered: usize,
    pub failed: usize,
    /// Due remotes skipped because nothing new was announced.
    pub idle: usize,
    pub not_due: usize,
    pub placed_on_hold: usize,
    pub remotes_evicted: usize,
    pub announces_evicted: usize,
}

pub struct Dispatcher<N> {
    announces: Arc<AnnounceRegistry>,
    remotes: Arc<RemoteRegistry>,
    notifier: N,
    clock: SharedClock,
    max_failures: u32,
    remote_on_hold_max_timeout: Duration,
    announce_max_timeout: Duration,
}

impl<N: Notifier> Dispatcher<N> {
    pub(crate) fn new(
        announces: Arc<AnnounceRegistry>,
        remotes: Arc<RemoteRegistry>,
        notifier: N,
        clock: SharedClock,
        config: &HookConfig,
    ) -> Self {
        Self {
            announces,
            remotes,
            notifier,
            clock,
            max_failures: config.max_failures,
            remote_on_hold_max_timeout: config.remote_on_hold_max_timeout,
            announce_max_timeout: config.announce_max_timeout,
        }
    }

    /// Run one reconciliation pass.
    ///
    /// The remote registry stays locked for the whole pass, deliveries
    /// included. Delivery failures are counted against the remote and never
    /// abort the pass.
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();
        let mut pass = self.remotes.pass().await;

        for remote in pass.active() {
            let now = self.clock.now();
            let reference = schedule::due_reference(remote.last_call_at, remote.interval, now);
            if !schedule::is_due(reference, now) {
                report.not_due += 1;
                continue;
            }

            let hashes = self.announces.collect_since(reference).await;
            if hashes.is_empty() {
                report.idle += 1;
                continue;
            }

            match self.notifier.notify(&remote.address, &hashes).await {
                Ok(()) => {
                    pass.record_success(&remote.address);
                    report.delivered += 1;
                    metrics::increment_counter!("dha_deliveries_total", "outcome" => "success");
                    debug!(address = %remote.address, count = hashes.len(), "announces delivered");
                }
                Err(e) => {
                    report.failed += 1;
                    metrics::increment_counter!("dha_deliveries_total", "outcome" => "failure");
                    warn!(
                        address = %remote.address,
                        failures = remote.failure_count.saturating_add(1),
                        "delivery failed: {}",
                        e
                    );
                    if pass.record_failure(&remote.address, self.max_failures) {
                        report.placed_on_hold += 1;
                        info!(address = %remote.address, "remote put on hold");
                    }
                }
            }
        }

        let now = self.clock.now();
        report.remotes_evicted = pass.evict_on_hold(now, self.remote_on_hold_max_timeout);
        if report.remotes_evicted > 0 {
            info!(count = report.remotes_evicted, "evicted remotes on hold");
        }
        drop(pass);

        report.announces_evicted = self
            .announces
            .evict_expired(now, self.announce_max_timeout)
            .await;

        metrics::gauge!("dha_remotes", self.remotes.len().await as f64);
        metrics::gauge!("dha_announces", self.announces.len().await as f64);

        report
    }

    /// Tick every `period` until `shutdown` fires.
    ///
    /// The first tick happens one period after start. A delivery in flight
    /// when shutdown fires is finished before the loop exits.
    pub async fn run(self, period: std::time::Duration, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick of an interval completes immediately
        ticker.tick().await;

        info!(period_ms = period.as_millis() as u64, "dispatcher started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let report = self.tick().await;
                    if report != TickReport::default() {
                        debug!(?report, "tick");
                    }
                }
            }
        }

        info!("dispatcher stopped");
    }
}
