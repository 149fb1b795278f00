//! Error types for the light endpoint runtime

use thiserror::Error;

/// Errors that can occur while hosting light endpoints
#[derive(Error, Debug)]
pub enum EndpointError {
    /// No endpoint with this id is hosted
    #[error("Endpoint not found: {0}")]
    NotFound(u8),

    /// The endpoint task is no longer running
    #[error("Endpoint {0} is closed")]
    Closed(u8),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error (configuration file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
