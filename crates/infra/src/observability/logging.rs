//! Tracing subscriber setup

use tether_common::{CommonError, CommonResult};
use tether_domain::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber described by `config`
///
/// `RUST_LOG` takes precedence over `config.level` when set.
///
/// # Errors
///
/// Returns `CommonError::Config` for an unparseable level and
/// `CommonError::Internal` if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> CommonResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(&config.level)?,
    };

    let (plain, json) = if config.json {
        (None, Some(fmt::layer().json().with_current_span(true)))
    } else {
        (Some(fmt::layer().with_target(true)), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .try_init()
        .map_err(|e| CommonError::internal(format!("failed to install subscriber: {e}")))?;

    tracing::debug!(level = %config.level, json = config.json, "Logging initialized");
    Ok(())
}

fn level_filter(level: &str) -> CommonResult<EnvFilter> {
    EnvFilter::try_new(level).map_err(|e| CommonError::config_field("logging.level", e.to_string()))
}
