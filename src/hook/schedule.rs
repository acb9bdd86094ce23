//! Time predicates shared by the registries and the dispatcher.
//!
//! Every "is this due", "is this stale" and "can this go" decision is made
//! here, against an explicit `now`.

use chrono::{DateTime, Duration, Utc};

/// Threshold used to decide whether a remote is due and which announces it
/// gets.
///
/// A remote that was never called is due right away and receives what was
/// seen during the last `interval`. Otherwise it is due `interval` after its
/// last successful call.
pub fn due_reference(
    last_call_at: Option<DateTime<Utc>>,
    interval: Duration,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    match last_call_at {
        None => now
            .checked_sub_signed(interval)
            .unwrap_or(DateTime::<Utc>::MIN_UTC),
        Some(last) => last
            .checked_add_signed(interval)
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    }
}

pub fn is_due(reference: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    reference <= now
}

/// Whether an announce last seen at `last_seen` belongs to a batch built from
/// `threshold`.
pub fn seen_after(last_seen: DateTime<Utc>, threshold: DateTime<Utc>) -> bool {
    last_seen > threshold
}

pub fn is_expired(last_seen: DateTime<Utc>, max_age: Duration, now: DateTime<Utc>) -> bool {
    last_seen
        .checked_add_signed(max_age)
        .is_some_and(|deadline| deadline < now)
}

/// Eviction test for a remote on hold.
///
/// NOTE: this removes the remote while `on_hold_since + max_timeout` is still
/// in the future, i.e. inside the hold window, not after it. A remote put on
/// hold is therefore evicted by the sweep that follows. Kept as is until the
/// intended semantics are settled; `tests::test_eviction_inside_hold_window`
/// pins it.
pub fn is_evictable(
    on_hold_since: DateTime<Utc>,
    max_timeout: Duration,
    now: DateTime<Utc>,
) -> bool {
    on_hold_since
        .checked_add_signed(max_timeout)
        .map_or(true, |deadline| deadline > now)
}
