use thiserror::Error;

pub type HookResult<T> = Result<T, HookError>;

/// Errors surfaced to callers of `record` and `subscribe`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HookError {
    /// Permanent input rejection; retrying the same call will fail again.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Admission control rejection; try again later.
    #[error("try again later: {registry} registry is full ({max} entries)")]
    CapacityExceeded { registry: Registry, max: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed address {address:?}: {reason}")]
    MalformedAddress { address: String, reason: String },
    #[error("interval too short: {interval_secs}s < {min_secs}s")]
    IntervalTooShort { interval_secs: i64, min_secs: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registry {
    Announces,
    Remotes,
}

impl std::fmt::Display for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Registry::Announces => write!(f, "announce"),
            Registry::Remotes => write!(f, "remote"),
        }
    }
}

impl HookError {
    /// Whether the caller may succeed by retrying later.
    pub fn is_transient(&self) -> bool {
        matches!(self, HookError::CapacityExceeded { .. })
    }
}

/// A failed push to a remote. Handled inside the dispatcher.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remote answered with status {0}")]
    Status(u16),
}
