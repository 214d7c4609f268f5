//! Error types for chatline
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for chatline operations
///
/// Covers configuration problems, every failure mode of the backend
/// client (network, non-success status, malformed body), and local I/O.
#[derive(Error, Debug)]
pub enum ChatlineError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request could not complete (connection refused, DNS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status
    #[error("Server error {status}: {detail}")]
    Server {
        /// HTTP status code returned by the backend
        status: u16,
        /// `detail` field of the error body, or the raw body text
        detail: String,
    },

    /// The backend answered 404 for the requested resource
    #[error("Not found: {0}")]
    NotFound(String),

    /// The response body was missing fields or had the wrong shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// User input rejected before any request was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Line editor errors
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

/// Result type alias for chatline operations
///
/// Uses `anyhow::Error` so call sites can attach context; the typed
/// `ChatlineError` is recovered with `downcast_ref` where the kind matters.
pub type Result<T> = anyhow::Result<T>;
