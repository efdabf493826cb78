//! Error types for view-state operations

use std::fmt;
use thiserror::Error;

/// A single failed form rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name, in wire (camelCase) spelling
    pub field: &'static str,
    /// Message shown next to the field
    pub message: String,
}

/// Field-level validation failures, in form order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Record a failure on `field`
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// True when no rule failed
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of failed rules
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// First message recorded for `field`
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// All failures
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors from the persisted session store
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing the backing file failed
    #[error("Session store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file or a stored value is not valid JSON
    #[error("Session store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Login attempted with a malformed email
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

/// Violations of rack slot or VM parent invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RackError {
    /// Two hosts claim the same U slot
    #[error("Host {host} overlaps {other} in rack {rack} at U{slot}")]
    Overlap {
        /// Rack id
        rack: String,
        /// Host found second in slot order
        host: String,
        /// Host already holding the slot
        other: String,
        /// First shared slot
        slot: u8,
    },

    /// Slot range leaves the rack
    #[error("Host {host} occupies U{first}-U{last}, outside rack {rack} (1-{total})")]
    OutOfRange {
        /// Rack id
        rack: String,
        /// Offending host
        host: String,
        /// Lowest slot claimed
        first: u16,
        /// Highest slot claimed
        last: u16,
        /// Rack height in U
        total: u8,
    },

    /// A VM references a host that is missing or not physical
    #[error("VM {vm} references {parent}, which is not a physical host")]
    InvalidParent {
        /// VM host id
        vm: String,
        /// Referenced parent id
        parent: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_report_first_message_per_field() {
        let mut errors = ValidationErrors::default();
        assert!(errors.clone().into_result().is_ok());

        errors.push("hostname", "too short");
        errors.push("hostname", "second");
        errors.push("ipAddress", "invalid");

        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("hostname"), Some("too short"));
        assert_eq!(errors.get("os"), None);
        assert_eq!(errors.to_string(), "hostname: too short; hostname: second; ipAddress: invalid");
        assert!(errors.into_result().is_err());
    }
}
