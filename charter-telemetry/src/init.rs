//! Telemetry initialization

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Initialize console logging at `info` unless `RUST_LOG` says otherwise.
///
/// # Example
/// ```
/// use charter_telemetry::init_telemetry;
/// init_telemetry("charter").expect("Failed to initialize telemetry");
/// ```
pub fn init_telemetry(service_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    init_with_level(service_name, "info")
}

/// Initialize console logging with an explicit default level.
///
/// The subscriber is installed at most once per process; later calls are no-ops.
///
/// # Arguments
/// * `service_name` - Name recorded on the initialization event
/// * `level` - Default filter directive used when `RUST_LOG` is unset
pub fn init_with_level(service_name: &str, level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)?,
    };

    INIT.call_once(|| {
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init();

        if installed.is_ok() {
            tracing::info!(service.name = service_name, "Telemetry initialized");
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        assert!(init_with_level("charter-test", "debug").is_ok());
        assert!(init_telemetry("charter-test").is_ok());
    }
}
