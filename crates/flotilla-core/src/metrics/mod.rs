use std::sync::Arc;

use crate::pacing::Phase;

/// Metrics sink for batch lifecycle events.
pub trait MetricsBackend: Send + Sync {
    /// A create request was accepted by the provider.
    fn record_create(&self);
    /// A delete request was accepted by the provider.
    fn record_delete(&self);
    /// One termination poll cycle ran.
    fn record_poll_cycle(&self);
    /// One handle sweep ran in `phase`.
    fn record_sweep(&self, phase: Phase);
    /// The batch failed in `phase`.
    fn record_failure(&self, phase: Phase);
}

pub type MetricsHandle = Arc<dyn MetricsBackend>;

/// Backend that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsBackend for NoopMetrics {
    fn record_create(&self) {}
    fn record_delete(&self) {}
    fn record_poll_cycle(&self) {}
    fn record_sweep(&self, _phase: Phase) {}
    fn record_failure(&self, _phase: Phase) {}
}

pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoopMetrics)
}
