use thiserror::Error;

/// Message fragments that mark a failure as transient and worth retrying.
///
/// Matched case-insensitively against the error text.
pub const RETRYABLE_KEYWORDS: &[&str] = &[
    "timeout",
    "network",
    "connection",
    "econnreset",
    "reset",
    "enotfound",
    "econnrefused",
    "etimedout",
    "socket timeout",
    "fetch",
    "download",
    "buffer",
    "memory",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GroupingError {
    #[error("invalid grouping options: {0}")]
    Validation(String),
    #[error("required capabilities unavailable: {}", .missing.join(", "))]
    DependencyUnavailable { missing: Vec<String> },
    #[error("{0}")]
    Transient(String),
    #[error("{0}")]
    Unknown(String),
    #[error("grouping cancelled")]
    Cancelled,
}

impl GroupingError {
    /// Classifies a collaborator failure by its message.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if RETRYABLE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            GroupingError::Transient(message)
        } else {
            GroupingError::Unknown(message)
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, GroupingError::Transient(_))
    }

    /// Short machine-friendly name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            GroupingError::Validation(_) => "validation",
            GroupingError::DependencyUnavailable { .. } => "dependency_unavailable",
            GroupingError::Transient(_) => "transient",
            GroupingError::Unknown(_) => "unknown",
            GroupingError::Cancelled => "cancelled",
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for GroupingError {
    fn from(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        GroupingError::classify(e.to_string())
    }
}
