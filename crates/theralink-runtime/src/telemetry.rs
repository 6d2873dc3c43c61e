//! Tracing subscriber setup for binaries embedding the pipeline

use theralink_core::{TheraLinkError, TheraLinkResult};
use tracing_subscriber::EnvFilter;

/// Log output settings
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is unset, e.g. `"info"` or `"theralink_session=debug"`
    pub default_filter: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig {
            default_filter: "info".to_string(),
            json: false,
        }
    }
}

/// Install the global tracing subscriber; fails if one is already set
pub fn init_tracing(config: &TelemetryConfig) -> TheraLinkResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.default_filter)
            .map_err(|e| TheraLinkError::InvalidConfig(format!("log filter: {}", e)))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| TheraLinkError::Runtime(e.to_string()))
}
