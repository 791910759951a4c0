//! Error handling for the traffic simulator
//!
//! This module provides a single error type that:
//! - Categorizes errors by kind (timeout, network, configuration, etc.)
//! - Separates fatal startup errors from per-request failures
//! - Maps HTTP and JSON errors to normalized variants
//! - Provides a convenient Result type alias

use thiserror::Error;

/// Result type for traffic simulator operations
pub type Result<T> = std::result::Result<T, SimError>;

/// Main error type for the traffic simulator
#[derive(Error, Debug)]
pub enum SimError {
    /// Timeout errors, including the injected vector-store fault
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Network or connection errors
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Collaborator construction errors
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// The collaborator has no backing vector store
    #[error("Vector store unavailable: {0}")]
    VectorStoreUnavailable(String),

    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Errors reported by an upstream service
    #[error("Service error: {0}")]
    Service(String),

    /// Response parsing errors
    #[error("Parsing error: {0}")]
    Parsing(String),
}

impl SimError {
    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        SimError::Timeout(message.into())
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        SimError::Network(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        SimError::Configuration(message.into())
    }

    /// Create an initialization error
    pub fn initialization(message: impl Into<String>) -> Self {
        SimError::Initialization(message.into())
    }

    /// Create a vector-store-unavailable error
    pub fn vector_store_unavailable(message: impl Into<String>) -> Self {
        SimError::VectorStoreUnavailable(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        SimError::Validation(message.into())
    }

    /// Create a service error
    pub fn service(message: impl Into<String>) -> Self {
        SimError::Service(message.into())
    }

    /// Create a parsing error
    pub fn parsing(message: impl Into<String>) -> Self {
        SimError::Parsing(message.into())
    }

    /// Whether this error prevents the simulation loop from starting
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            SimError::Initialization(_)
                | SimError::Configuration(_)
                | SimError::VectorStoreUnavailable(_)
        )
    }

    /// Whether this error is a connection-level failure (timeout or unreachable peer)
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, SimError::Timeout(_) | SimError::Network(_))
    }
}

/// Convert reqwest errors to SimError
impl From<reqwest::Error> for SimError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SimError::timeout(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            SimError::network(format!("Connection failed: {}", err))
        } else if err.is_builder() {
            SimError::configuration(format!("Invalid HTTP client settings: {}", err))
        } else if err.is_decode() {
            SimError::parsing(format!("Response decode error: {}", err))
        } else {
            SimError::network(format!("HTTP client error: {}", err))
        }
    }
}

/// Convert Qdrant client errors to SimError
impl From<qdrant_client::QdrantError> for SimError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        SimError::service(format!("Qdrant error: {}", err))
    }
}

/// Convert serde_json errors to SimError
impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::parsing(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::timeout("simulated vector-store timeout: unreachable");
        assert_eq!(
            err.to_string(),
            "Timeout error: simulated vector-store timeout: unreachable"
        );

        let err = SimError::vector_store_unavailable("no backend");
        assert_eq!(err.to_string(), "Vector store unavailable: no backend");
    }

    #[test]
    fn test_startup_fatal_classification() {
        assert!(SimError::initialization("boom").is_startup_fatal());
        assert!(SimError::configuration("bad rate").is_startup_fatal());
        assert!(SimError::vector_store_unavailable("none").is_startup_fatal());

        assert!(!SimError::timeout("slow").is_startup_fatal());
        assert!(!SimError::service("500").is_startup_fatal());
    }

    #[test]
    fn test_connection_failure_classification() {
        assert!(SimError::timeout("t").is_connection_failure());
        assert!(SimError::network("n").is_connection_failure());
        assert!(!SimError::validation("v").is_connection_failure());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: SimError = json_err.into();
        assert!(matches!(err, SimError::Parsing(_)));
    }
}
