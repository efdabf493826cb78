//! Page controllers.
//!
//! Each page owns the collections it fetched, the derived view, dialog state
//! and the notices produced by its last action. Pages talk to the backend only
//! through [`IpamService`](ipam_client::IpamService).

pub mod dashboard;
pub mod hosts;
pub mod reports;
pub mod subnets;

use std::fmt;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Feedback for the user after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub detail: Option<String>,
}

impl Notice {
    /// Informational notice
    pub fn info(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            detail: None,
        }
    }

    /// Success notice
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            detail: None,
        }
    }

    /// Error notice carrying a human-readable reason
    pub fn error(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            detail: Some(detail.into()),
        }
    }

    /// Attach detail text
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
        };
        match &self.detail {
            Some(detail) => write!(f, "[{}] {}: {}", marker, self.title, detail),
            None => write!(f, "[{}] {}", marker, self.title),
        }
    }
}
