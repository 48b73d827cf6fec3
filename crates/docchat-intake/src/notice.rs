//! Transient user-facing notices (toasts).
//!
//! Conflict, transport and batch-summary feedback is shown as an
//! auto-dismissing notice. Per-file validation and server errors are not
//! notices; they stay attached to their registry row.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Something completed.
    Success,
    /// Something was partially skipped; the rest went through.
    Warning,
    /// Something failed.
    Error,
}

/// A message to show for a limited time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity, used for styling.
    pub level: NoticeLevel,
    /// Text shown to the user.
    pub message: String,
    /// How long the notice stays visible.
    pub duration: Duration,
}

impl Notice {
    /// A success notice.
    #[must_use]
    pub fn success(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            duration,
        }
    }

    /// A warning notice.
    #[must_use]
    pub fn warning(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
            duration,
        }
    }

    /// An error notice.
    #[must_use]
    pub fn error(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            duration,
        }
    }
}
