//! Inputs and outputs of the deck controller: decisions to confirm, their outcomes,
//! and the transient feedback surfaced to the user.

use std::time::Instant;

use chrono::{DateTime, Utc};
use shared::domain::{ApplicationStatus, JobId, Verdict};

use crate::{deck::Card, error::DecisionError};

/// Confirmation the caller must send to the decision sink after a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDecision {
    pub card_id: JobId,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionOutcome {
    pub card_id: JobId,
    pub verdict: Verdict,
    pub result: Result<(), DecisionError>,
}

impl DecisionOutcome {
    pub fn confirmed(decision: PendingDecision) -> Self {
        Self {
            card_id: decision.card_id,
            verdict: decision.verdict,
            result: Ok(()),
        }
    }

    pub fn failed(decision: PendingDecision, error: DecisionError) -> Self {
        Self {
            card_id: decision.card_id,
            verdict: decision.verdict,
            result: Err(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    /// No auth context; show a login prompt instead of the deck.
    Unauthenticated,
    /// Feed could not be fetched; show a retriable full-panel error.
    SupplyFailed(String),
    Ready,
    /// Nothing left to swipe; only a refresh leaves this state.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPhase {
    Idle,
    Dragging,
    /// Exit animation of a committed card; pointer-downs are ignored.
    Committing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackTone {
    Accepted,
    Declined,
    Failed,
}

/// Short-lived banner ("Applied!", "Declined", or a failure message).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub text: String,
    pub tone: FeedbackTone,
    pub expires_at: Instant,
}

impl Feedback {
    pub fn is_visible_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Toast queued for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub card_id: Option<JobId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedItem {
    pub card: Card,
    pub status: ApplicationStatus,
    pub accepted_at: DateTime<Utc>,
}
