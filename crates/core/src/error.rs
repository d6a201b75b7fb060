//! Shared error type for backend collaborators

use thiserror::Error;

/// Errors produced by backend collaborators behind the seam traits.
///
/// Handlers translate these into the user-facing [`crate::ErrorKind`]
/// taxonomy before anything reaches the response stream.
#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Device("plug offline".to_string());
        assert_eq!(err.to_string(), "Device error: plug offline");
        assert_eq!(Error::Timeout.to_string(), "Timeout");
    }
}
