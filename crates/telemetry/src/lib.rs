//! Tracing subscriber bootstrap.

use anyhow::Context;
use bookshelf_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the `EnvFilter`; `RUST_LOG` takes precedence over the configured directive.
pub fn env_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.log_filter)
            .with_context(|| format!("invalid log filter '{}'", settings.log_filter)),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = env_filter(settings)?;
    let registry = tracing_subscriber::registry().with(filter);

    match settings.log_format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true))
            .try_init()
            .context("failed to install tracing subscriber")?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
            .context("failed to install tracing subscriber")?,
    }

    tracing::debug!(
        target: "bookshelf-telemetry",
        format = ?settings.log_format,
        "telemetry initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_filter_is_parsed() {
        let settings = TelemetrySettings {
            log_format: LogFormat::Pretty,
            log_filter: "bookshelf_app=debug,tower_http=info".to_string(),
        };
        assert!(env_filter(&settings).is_ok());
    }

    #[test]
    fn second_init_fails() {
        let settings = TelemetrySettings::default();
        let _ = init(&settings);
        assert!(init(&settings).is_err());
    }
}
