use std::path::PathBuf;

/// Result type used across the vigil crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that can occur while talking to a camera or handling what it
/// sends back. Each variant maps onto one failure class of the control
/// system, so callers can decide what is fatal and what only fails a step.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Login was rejected, the reply carried no token, or a call that needs
    /// a token was attempted before logging in.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The device answered with a non-success status code.
    #[error("HTTP error: {endpoint} returned {status}")]
    Http {
        /// Command that was being issued, e.g. `Snap`.
        endpoint: &'static str,
        /// Status code returned by the device.
        status: reqwest::StatusCode,
    },

    /// The JSON envelope could not be decoded.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Transport failure, including the per-call timeout expiring.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Local I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot sink could not accept the image bytes.
    #[error("Failed to persist snapshot to {target}: {source}")]
    Persist {
        /// Human readable name of the sink, usually a file path.
        target: String,
        /// Underlying write failure.
        source: std::io::Error,
    },

    /// Configuration could not be read or deserialised.
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration file does not exist.
    #[error("Could not locate the config file {0:?}")]
    ConfigNotFound(PathBuf),
}

impl Error {
    /// True for failures that mean the device did not accept our credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }
}
