use thiserror::Error;

use sensor_dispatch::TransportError;

/// Top-level error type for the instrument application.
#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}
