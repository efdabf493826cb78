//! IPAC client errors

use thiserror::Error;

/// Message shown when neither the backend nor the transport gave anything readable
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred, please try again later";

/// Errors that can occur when interacting with the IPAC API
#[derive(Debug, Error)]
pub enum IpamError {
    /// HTTP request/response error (timeout, connection refused, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status
    #[error("IPAC API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body, may be empty
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (e.g., missing identifier on update)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl IpamError {
    /// Human-readable message for notifications.
    ///
    /// Prefers the backend's own `message`, then the transport error text,
    /// then [`GENERIC_ERROR_MESSAGE`].
    pub fn user_message(&self) -> String {
        let message = match self {
            IpamError::Api { message, .. } => message.trim().to_string(),
            IpamError::Http(e) => e.to_string(),
            IpamError::Serialization(e) => e.to_string(),
            IpamError::NotFound(m) | IpamError::InvalidRequest(m) => m.clone(),
        };
        if message.is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}
