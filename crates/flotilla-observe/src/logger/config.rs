use std::{env, io::IsTerminal};

use crate::logger::{error::LoggerError, format::LoggerFormat};

/// Filter directive used when none is configured: batch progress from every
/// `flotilla.*` target, warnings from everything else.
pub const DEFAULT_DIRECTIVE: &str = "warn,flotilla=info";

pub const ENV_LOG: &str = "FLOTILLA_LOG";
pub const ENV_LOG_FORMAT: &str = "FLOTILLA_LOG_FORMAT";
pub const ENV_LOG_SPANS: &str = "FLOTILLA_LOG_SPANS";

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directive, e.g. `"warn,flotilla=info,flotilla.core.poll=trace"`.
    pub directive: String,
    pub with_targets: bool,
    pub use_color: bool,
    /// Emit a line with busy/idle timings when an instrumented phase (launch, poll,
    /// cleanup, the whole batch) closes.
    pub span_timings: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            directive: DEFAULT_DIRECTIVE.to_string(),
            with_targets: true,
            use_color: std::io::stdout().is_terminal(),
            span_timings: false,
        }
    }
}

impl LoggerConfig {
    /// Defaults overridden by `FLOTILLA_LOG`, `FLOTILLA_LOG_FORMAT` and `FLOTILLA_LOG_SPANS`.
    pub fn from_env() -> Result<Self, LoggerError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, LoggerError> {
        let mut cfg = Self::default();
        if let Some(directive) = lookup(ENV_LOG).filter(|d| !d.trim().is_empty()) {
            cfg.directive = directive;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            cfg.format = format.parse()?;
        }
        if let Some(raw) = lookup(ENV_LOG_SPANS) {
            cfg.span_timings = raw.parse().map_err(|e: std::str::ParseBoolError| {
                LoggerError::InvalidEnv {
                    var: ENV_LOG_SPANS,
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(cfg)
    }

    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directive = directive.into();
        self
    }

    /// Raise or lower a single target on top of the current directive.
    pub fn with_target_level(mut self, target: &str, level: &str) -> Self {
        self.directive = format!("{},{target}={level}", self.directive);
        self
    }

    pub fn with_format(mut self, format: LoggerFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_span_timings(mut self, on: bool) -> Self {
        self.span_timings = on;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let vars: HashMap<_, _> = vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |k| vars.get(k).cloned()
    }

    #[test]
    fn unset_env_keeps_defaults() {
        let cfg = LoggerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.directive, DEFAULT_DIRECTIVE);
        assert_eq!(cfg.format, LoggerFormat::Text);
        assert!(!cfg.span_timings);
    }

    #[test]
    fn env_overrides_defaults() {
        let cfg = LoggerConfig::from_lookup(lookup(&[
            (ENV_LOG, "debug"),
            (ENV_LOG_FORMAT, "json"),
            (ENV_LOG_SPANS, "true"),
        ]))
        .unwrap();
        assert_eq!(cfg.directive, "debug");
        assert_eq!(cfg.format, LoggerFormat::Json);
        assert!(cfg.span_timings);
    }

    #[test]
    fn bad_env_value_names_the_variable() {
        let err = LoggerConfig::from_lookup(lookup(&[(ENV_LOG_SPANS, "sometimes")])).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidEnv { var: ENV_LOG_SPANS, .. }));

        let err = LoggerConfig::from_lookup(lookup(&[(ENV_LOG_FORMAT, "yaml")])).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidFormat(_)));
    }

    #[test]
    fn target_level_is_appended() {
        let cfg = LoggerConfig::default().with_target_level("flotilla.core.poll", "trace");
        assert_eq!(cfg.directive, "warn,flotilla=info,flotilla.core.poll=trace");
    }
}
