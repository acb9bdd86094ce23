pub mod debug;
pub mod duration;
pub mod health;
pub mod metrics;
pub mod subscribe;

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::Config;
use crate::hook::Hook;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub hook: Arc<Hook>,
    pub config: Config,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(hook: Arc<Hook>, config: Config) -> Self {
        Self {
            hook,
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
