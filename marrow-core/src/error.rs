//! Error types for Marrow

use thiserror::Error;

/// The main error type for Marrow operations
#[derive(Error, Debug)]
pub enum Error {
    /// Session could not be established, or a statement ran without one
    #[error("connection error: {message}")]
    Connection { message: String },

    /// Session could not be released
    #[error("disconnect error: {message}")]
    Disconnection { message: String },

    /// Statement execution failed; the engine message is passed through
    #[error("query execution error: {message}")]
    Query { message: String },

    /// Malformed builder state or row shape
    #[error("invalid statement: {message}")]
    Validation { message: String },

    /// Record lifecycle violation
    #[error("record state error: {message}")]
    State { message: String },

    /// Configuration names an engine with no adapter
    #[error("unsupported configuration: {message}")]
    UnsupportedConfiguration { message: String },

    /// An operation failed and releasing the session afterwards failed too.
    /// Both failures are preserved; the operation failure comes first.
    #[error("{failure} (session release also failed: {release})")]
    ReleaseFailed {
        failure: Box<Error>,
        release: Box<Error>,
    },
}

/// Convenience Result type for Marrow operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a new disconnection error
    pub fn disconnection(message: impl Into<String>) -> Self {
        Self::Disconnection {
            message: message.into(),
        }
    }

    /// Create a new query execution error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new record state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a new unsupported configuration error
    pub fn unsupported_configuration(message: impl Into<String>) -> Self {
        Self::UnsupportedConfiguration {
            message: message.into(),
        }
    }

    /// Combine an operation failure with a follow-on session release failure
    pub fn release_failed(failure: Error, release: Error) -> Self {
        Self::ReleaseFailed {
            failure: Box::new(failure),
            release: Box::new(release),
        }
    }
}
