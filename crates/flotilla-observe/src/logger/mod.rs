//! Global `tracing` subscriber setup for flotilla binaries.

mod config;
mod error;
mod format;
mod log;

pub use config::{DEFAULT_DIRECTIVE, ENV_LOG, ENV_LOG_FORMAT, ENV_LOG_SPANS, LoggerConfig};
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Install the global subscriber described by `cfg`. Fails if one is already set.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    match cfg.format {
        LoggerFormat::Text => log::init_text(cfg),
        LoggerFormat::Json => log::init_json(cfg),
        LoggerFormat::Journald => log::init_journald(cfg),
    }?;
    tracing::debug!(
        target: "flotilla.observe",
        format = %cfg.format,
        directive = %cfg.directive,
        "logger initialized"
    );
    Ok(())
}

/// [`logger_init`] with [`LoggerConfig::from_env`].
pub fn logger_init_from_env() -> Result<LoggerConfig, LoggerError> {
    let cfg = LoggerConfig::from_env()?;
    logger_init(&cfg)?;
    Ok(cfg)
}
