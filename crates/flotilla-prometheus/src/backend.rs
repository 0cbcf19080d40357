use flotilla_core::{MetricsBackend, Phase};
use prometheus::{IntCounter, IntCounterVec, Opts, Registry, proto::MetricFamily};

#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    creates: IntCounter,
    deletes: IntCounter,
    poll_cycles: IntCounter,
    sweeps: IntCounterVec,
    failures: IntCounterVec,
}

impl PrometheusMetrics {
    /// Register the collectors in a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Register the collectors in `registry`.
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let creates = IntCounter::with_opts(Opts::new(
            "flotilla_creates_total",
            "Container group create requests accepted",
        ))?;
        let deletes = IntCounter::with_opts(Opts::new(
            "flotilla_deletes_total",
            "Container group delete requests accepted",
        ))?;
        let poll_cycles = IntCounter::with_opts(Opts::new(
            "flotilla_poll_cycles_total",
            "Termination poll cycles run",
        ))?;
        let sweeps = IntCounterVec::new(
            Opts::new("flotilla_sweeps_total", "Handle sweeps run per phase"),
            &["phase"],
        )?;
        let failures = IntCounterVec::new(
            Opts::new("flotilla_failures_total", "Batches that failed, by phase"),
            &["phase"],
        )?;

        registry.register(Box::new(creates.clone()))?;
        registry.register(Box::new(deletes.clone()))?;
        registry.register(Box::new(poll_cycles.clone()))?;
        registry.register(Box::new(sweeps.clone()))?;
        registry.register(Box::new(failures.clone()))?;

        Ok(Self {
            registry,
            creates,
            deletes,
            poll_cycles,
            sweeps,
            failures,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_create(&self) {
        self.creates.inc();
    }

    fn record_delete(&self) {
        self.deletes.inc();
    }

    fn record_poll_cycle(&self) {
        self.poll_cycles.inc();
    }

    fn record_sweep(&self, phase: Phase) {
        self.sweeps.with_label_values(&[phase.as_str()]).inc();
    }

    fn record_failure(&self, phase: Phase) {
        self.failures.with_label_values(&[phase.as_str()]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Encoder, TextEncoder};

    fn render(m: &PrometheusMetrics) -> String {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&m.gather(), &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn counters_are_exported() {
        let m = PrometheusMetrics::new().unwrap();
        m.record_create();
        m.record_create();
        m.record_delete();
        m.record_poll_cycle();
        m.record_sweep(Phase::Launch);
        m.record_failure(Phase::Cleanup);

        let out = render(&m);
        assert!(out.contains("flotilla_creates_total 2"));
        assert!(out.contains("flotilla_deletes_total 1"));
        assert!(out.contains("flotilla_poll_cycles_total 1"));
        assert!(out.contains(r#"flotilla_sweeps_total{phase="launch"} 1"#));
        assert!(out.contains(r#"flotilla_failures_total{phase="cleanup"} 1"#));
    }

    #[test]
    fn double_registration_fails() {
        let registry = Registry::new();
        PrometheusMetrics::with_registry(registry.clone()).unwrap();
        assert!(PrometheusMetrics::with_registry(registry).is_err());
    }
}
