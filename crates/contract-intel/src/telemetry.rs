//! Process-wide tracing subscriber.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::ContractIntelError;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Installs the global subscriber. `RUST_LOG` wins over the configured
/// level. Events go to stderr so stdout stays free for command output.
///
/// Only the first call does anything; later calls return `Ok(())`.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ContractIntelError> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ContractIntelError::Telemetry(format!("invalid log filter: {}", e)))?;

    let result = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| ContractIntelError::Telemetry(e.to_string()))
}
