use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;
use crate::error::{Error, Result};

/// Installs the global subscriber. `RUST_LOG` wins over the `info` default.
pub fn init(format: LogFormat) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new("info,sqlx=warn")
            .map_err(|e| Error::Config(format!("invalid log filter: {}", e)))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    let installed = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| Error::Config(format!("failed to install tracing subscriber: {}", e)))
}
