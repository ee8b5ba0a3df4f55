use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::InstrumentError;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (from the config)
/// is used.  Logs go to stderr.
pub fn init_logging(default_filter: &str) -> Result<(), InstrumentError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| InstrumentError::Logging(format!("bad filter {:?}: {}", default_filter, e)))?,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init()
        .map_err(|e| InstrumentError::Logging(e.to_string()))
}
