//! Error types for Builder Buddy.
//!
//! Executor failures are not here: they are user-facing transcript content
//! and live in [`crate::executors::Failure`].

/// Top-level error type for the binary and the relay server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Errors raised while running the relay server.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Relay failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },
}

/// Result type alias for Builder Buddy.
pub type Result<T> = std::result::Result<T, Error>;
