//! Failure taxonomy for the job feed: view-level supply errors, per-card decision
//! and analysis errors.

use std::time::Duration;

use thiserror::Error;

/// Errors that abort rendering of the whole deck.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupplyError {
    #[error("not authenticated; sign in to see your job feed")]
    AuthMissing,
    #[error("failed to load job feed: {0}")]
    FetchFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionFailureKind {
    RateLimited { retry_after: Option<Duration> },
    PermissionDenied,
    Other,
}

/// A decision the backend did not record. Never fatal; the card stays in the deck.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DecisionError {
    kind: DecisionFailureKind,
    message: String,
}

impl DecisionError {
    pub fn rate_limited(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self {
            kind: DecisionFailureKind::RateLimited { retry_after },
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self {
            kind: DecisionFailureKind::PermissionDenied,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: DecisionFailureKind::Other,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> DecisionFailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self.kind, DecisionFailureKind::RateLimited { .. })
    }

    /// Text for the transient toast shown after a failed swipe.
    pub fn user_message(&self) -> String {
        match self.kind {
            DecisionFailureKind::RateLimited {
                retry_after: Some(wait),
            } => {
                let minutes = wait_minutes(wait);
                let unit = if minutes == 1 { "minute" } else { "minutes" };
                format!("Too many requests. Try again in {minutes} {unit}.")
            }
            DecisionFailureKind::RateLimited { retry_after: None } => {
                "Too many requests. Try again later.".to_string()
            }
            DecisionFailureKind::PermissionDenied => {
                if self.message.is_empty() {
                    "You don't have permission to do that.".to_string()
                } else {
                    format!("Permission denied: {}", self.message)
                }
            }
            DecisionFailureKind::Other => {
                if self.message.is_empty() {
                    "Something went wrong. Please try again.".to_string()
                } else {
                    format!("Failed to save your choice: {}", self.message)
                }
            }
        }
    }
}

/// Whole minutes to wait, rounded up, never less than one.
pub fn wait_minutes(wait: Duration) -> u64 {
    wait.as_secs().div_ceil(60).max(1)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fit check failed: {0}")]
pub struct AnalysisError(pub String);
