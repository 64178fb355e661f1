//! Error types for the admin console
//!
//! This module defines the error taxonomy shared by the session layer, the
//! list controllers and the REST gateway, along with helpers the front end
//! uses to turn failures into user-visible messages.

use std::path::PathBuf;
use thiserror::Error;

/// Why an authentication-related operation failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// Email/password pair was refused by the login endpoint
    #[error("invalid email or password: {0}")]
    InvalidCredentials(String),

    /// The bearer token was rejected (expired or revoked)
    #[error("session token rejected: {0}")]
    TokenRejected(String),

    /// A protected action was attempted without a session
    #[error("not logged in")]
    MissingCredential,
}

/// Main error type for admin console operations
#[derive(Error, Debug)]
pub enum AdminError {
    /// Authentication failed or no session is present
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthFailure),

    /// Request did not complete (connectivity, DNS, timeout)
    #[error("Network error calling '{endpoint}': {message}")]
    Network { endpoint: String, message: String },

    /// The API answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Client-side validation rejected the input before dispatch
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Response body could not be decoded
    #[error("Unexpected response format: {0}")]
    Decode(String),

    /// Durable session storage could not be read or written
    #[error("Session storage error at '{path}': {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation was abandoned because its owner went away
    #[error("Operation cancelled")]
    Cancelled,
}

impl AdminError {
    /// Create a network error for an endpoint
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create an API status error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a storage error with path context
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this error means the session is unusable and the user must log in
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Check if re-triggering the same request could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Message suitable for an inline notice
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(AuthFailure::MissingCredential) => {
                "Please log in to continue.".to_string()
            }
            Self::Auth(AuthFailure::TokenRejected(_)) => {
                "Your session has expired. Please log in again.".to_string()
            }
            Self::Auth(AuthFailure::InvalidCredentials(msg)) => msg.clone(),
            Self::Api { message, .. } => message.clone(),
            Self::Validation { message, .. } => message.clone(),
            Self::Network { .. } => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Result type alias for admin console operations
pub type Result<T> = std::result::Result<T, AdminError>;

impl From<std::io::Error> for AdminError {
    fn from(err: std::io::Error) -> Self {
        AdminError::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        AdminError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for AdminError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        if err.is_decode() {
            AdminError::Decode(err.to_string())
        } else {
            AdminError::network(endpoint, err.to_string())
        }
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| AdminError::storage(path, e))
    }
}
