//! Console error types.
//!
//! Library errors are wrapped as-is; the variants defined here cover what
//! only the console itself can get wrong.

use ipam_client::IpamError;
use ipam_view::{RackError, SessionError, ValidationErrors};
use thiserror::Error;

/// Errors that can occur in the console.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// IPAC API error from a mutation or export
    #[error("IPAC error: {0}")]
    Ipam(#[from] IpamError),

    /// Form input rejected before reaching the backend
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Persisted session state could not be read or written
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Rack or parent relation violates an inventory invariant
    #[error("Inventory invariant violated: {0}")]
    Rack(#[from] RackError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Command needs a signed-in user
    #[error("Not signed in; run `ipam-console login` first")]
    NotAuthenticated,

    /// Host, subnet or rack not present in the fetched collection
    #[error("Not found: {0}")]
    NotFound(String),

    /// Writing an export or reading input failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConsoleError {
    /// Message for a notification
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Ipam(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
