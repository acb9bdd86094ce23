use anyhow::Result;
use serde::Deserialize;

use crate::hook::HookConfig;

/// Process configuration, read from `DHA_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Serve `/sub`.
    #[serde(default)]
    pub allow_sub: bool,

    /// Serve the `/debug` routes.
    #[serde(default = "default_debug")]
    pub debug: bool,

    /// Remote subscribed at startup.
    #[serde(default)]
    pub remote: Option<String>,

    #[serde(default = "default_remote_interval_secs")]
    pub remote_interval_secs: u64,

    #[serde(default = "default_remote_on_hold_max_timeout_secs")]
    pub remote_on_hold_max_timeout_secs: u64,

    #[serde(default = "default_max_failures")]
    pub max_failures: u32,

    #[serde(default = "default_max_remotes")]
    pub max_remotes: usize,

    #[serde(default = "default_min_remote_interval_secs")]
    pub min_remote_interval_secs: u64,

    #[serde(default = "default_announce_max_timeout_secs")]
    pub announce_max_timeout_secs: u64,

    #[serde(default = "default_max_announces")]
    pub max_announces: usize,

    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,

    #[serde(default = "default_delivery_timeout_secs")]
    pub delivery_timeout_secs: u64,
}

fn default_port() -> u16 {
    7945
}

fn default_debug() -> bool {
    true
}

fn default_remote_interval_secs() -> u64 {
    60 * 60
}

fn default_remote_on_hold_max_timeout_secs() -> u64 {
    3 * 24 * 60 * 60
}

fn default_max_failures() -> u32 {
    5
}

fn default_max_remotes() -> usize {
    1
}

fn default_min_remote_interval_secs() -> u64 {
    60 * 60
}

fn default_announce_max_timeout_secs() -> u64 {
    10 * 24 * 60 * 60
}

fn default_max_announces() -> usize {
    10_000_000
}

fn default_tick_period_ms() -> u64 {
    1000
}

fn default_delivery_timeout_secs() -> u64 {
    5
}

/// Seconds as a signed duration, saturating far beyond any sane setting.
fn secs(n: u64) -> chrono::Duration {
    const MAX_SECS: u64 = i64::MAX as u64 / 1000;
    chrono::Duration::seconds(n.min(MAX_SECS) as i64)
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("DHA").try_parsing(true))
            .build()?;

        let settings: Config = config.try_deserialize()?;

        Ok(settings)
    }

    pub fn remote_interval(&self) -> chrono::Duration {
        secs(self.remote_interval_secs)
    }

    pub fn hook_config(&self) -> HookConfig {
        HookConfig {
            remote_on_hold_max_timeout: secs(self.remote_on_hold_max_timeout_secs),
            max_failures: self.max_failures,
            max_remotes: self.max_remotes,
            min_remote_interval: secs(self.min_remote_interval_secs),
            announce_max_timeout: secs(self.announce_max_timeout_secs),
            max_announces: self.max_announces,
            tick_period: std::time::Duration::from_millis(self.tick_period_ms.max(1)),
            delivery_timeout: std::time::Duration::from_secs(self.delivery_timeout_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            allow_sub: false,
            debug: default_debug(),
            remote: None,
            remote_interval_secs: default_remote_interval_secs(),
            remote_on_hold_max_timeout_secs: default_remote_on_hold_max_timeout_secs(),
            max_failures: default_max_failures(),
            max_remotes: default_max_remotes(),
            min_remote_interval_secs: default_min_remote_interval_secs(),
            announce_max_timeout_secs: default_announce_max_timeout_secs(),
            max_announces: default_max_announces(),
            tick_period_ms: default_tick_period_ms(),
            delivery_timeout_secs: default_delivery_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 7945);
        assert!(!config.allow_sub);
        assert!(config.debug);
        assert!(config.remote.is_none());
    }

    #[test]
    fn test_default_matches_hook_defaults() {
        assert_eq!(Config::default().hook_config(), HookConfig::default());
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let config = Config {
            announce_max_timeout_secs: u64::MAX,
            ..Config::default()
        };
        assert!(config.hook_config().announce_max_timeout > chrono::Duration::days(365));
    }

    #[test]
    fn test_zero_tick_period_is_clamped() {
        let config = Config {
            tick_period_ms: 0,
            ..Config::default()
        };
        assert_eq!(
            config.hook_config().tick_period,
            std::time::Duration::from_millis(1)
        );
    }
}
