use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(
                    f,
                    "invalid log level/filter '{}': unable to build EnvFilter",
                    value
                )
            }
            TelemetryError::Subscriber(err) => write!(f, "telemetry error: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Builds the filter from `RUST_LOG`, falling back to the configured level.
///
/// Per-statement sqlx logging is capped at `warn` unless the filter names `sqlx` itself.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    let (filter, raw) = match EnvFilter::try_from_default_env() {
        Ok(filter) => {
            let raw = filter.to_string();
            (filter, raw)
        }
        Err(_) => {
            let filter = EnvFilter::try_new(&config.log_level).map_err(|source| {
                TelemetryError::EnvFilter {
                    value: config.log_level.clone(),
                    source,
                }
            })?;
            (filter, config.log_level.clone())
        }
    };

    if raw.contains("sqlx") {
        return Ok(filter);
    }

    let quiet_sqlx: Directive = "sqlx=warn"
        .parse()
        .map_err(|source| TelemetryError::EnvFilter {
            value: "sqlx=warn".to_string(),
            source,
        })?;
    Ok(filter.add_directive(quiet_sqlx))
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = env_filter(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(config.ansi)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(level: &str) -> TelemetryConfig {
        TelemetryConfig {
            log_level: level.to_string(),
            ansi: false,
        }
    }

    #[test]
    fn rejects_malformed_level() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let err = env_filter(&config("property_records=verbose"))
            .expect_err("filter must not parse");
        assert!(matches!(err, TelemetryError::EnvFilter { .. }));
    }

    #[test]
    fn quiets_sqlx_by_default() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let filter = env_filter(&config("debug")).expect("filter builds");
        assert!(filter.to_string().contains("sqlx=warn"));
    }
}
