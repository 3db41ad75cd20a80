use serde::{Deserialize, Serialize};

/// Severity of a transient notice, so the presentation layer can style
/// policy blocks differently from plain failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    Info,
    Error,
    /// The backend's authorization policy rejected a write.
    Blocked,
}

/// A short-lived user-visible message (rendered as a toast).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: &str) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.to_string(),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.to_string(),
        }
    }

    pub fn blocked(message: &str) -> Self {
        Self {
            kind: NoticeKind::Blocked,
            message: message.to_string(),
        }
    }
}
