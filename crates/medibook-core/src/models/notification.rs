//! Notification models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A message addressed to one identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    /// Generated notification ID
    pub id: String,
    /// Recipient identity ID
    pub identity_id: String,
    /// Short title
    pub title: String,
    /// Body text
    pub message: String,
    /// Severity
    pub severity: Severity,
    /// Read flag
    pub read: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create an unread notification.
    pub fn new(identity_id: String, title: String, message: String, severity: Severity) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            identity_id,
            title,
            message,
            severity,
            read: false,
            created_at: Utc::now(),
        }
    }
}
