//! Swipe deck controller: drag tracking, optimistic commit, and settlement of
//! background decision confirmations. Performs no I/O.

pub mod events;

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use chrono::Utc;
use shared::domain::{ApplicationStatus, FitReport, JobId, JobPosting, Verdict};
use tracing::{debug, info, warn};

use crate::{
    deck::{Card, Deck},
    error::{AnalysisError, SupplyError},
    fit_check::{FitCheckCache, FitCheckStart},
    gesture::{CardTransform, CommitPolicy, DragState, PointerButton, DEFAULT_ROTATION_DIVISOR},
};

pub use events::{
    AcceptedItem, CardPhase, DecisionOutcome, Feedback, FeedbackTone, Notification,
    NotificationLevel, PendingDecision, ViewState,
};

pub const DEFAULT_FEEDBACK_DURATION: Duration = Duration::from_millis(450);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    pub policy: CommitPolicy,
    pub rotation_divisor: f32,
    pub feedback_duration: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            policy: CommitPolicy::default(),
            rotation_divisor: DEFAULT_ROTATION_DIVISOR,
            feedback_duration: DEFAULT_FEEDBACK_DURATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadState {
    Loading,
    Unauthenticated,
    Failed(String),
    Loaded,
}

/// Snapshot of a committed card kept until its decision settles.
#[derive(Debug, Clone)]
struct InFlight {
    verdict: Verdict,
    card: Card,
}

pub struct DeckController {
    settings: ControllerSettings,
    load: LoadState,
    deck: Deck,
    drag: DragState,
    phase: CardPhase,
    in_flight: HashMap<JobId, InFlight>,
    accepted: Vec<AcceptedItem>,
    feedback: Option<Feedback>,
    notifications: Vec<Notification>,
    fit_checks: FitCheckCache,
}

impl Default for DeckController {
    fn default() -> Self {
        Self::new(ControllerSettings::default())
    }
}

impl DeckController {
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            settings,
            load: LoadState::Loading,
            deck: Deck::default(),
            drag: DragState::default(),
            phase: CardPhase::Idle,
            in_flight: HashMap::new(),
            accepted: Vec::new(),
            feedback: None,
            notifications: Vec::new(),
            fit_checks: FitCheckCache::default(),
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn begin_refresh(&mut self) {
        self.load = LoadState::Loading;
        self.reset_gesture();
    }

    /// Applies the result of a Job Supply fetch, replacing the deck wholesale.
    pub fn load(&mut self, result: Result<Vec<JobPosting>, SupplyError>) {
        self.reset_gesture();
        self.phase = CardPhase::Idle;
        match result {
            Ok(postings) => {
                let mut cards: Vec<Card> = postings.into_iter().map(Card::from).collect();
                self.fit_checks.restore(&mut cards);
                info!(cards = cards.len(), "job feed loaded");
                self.deck.replace(cards);
                self.load = LoadState::Loaded;
                self.skip_in_flight();
            }
            Err(SupplyError::AuthMissing) => {
                warn!("job feed requires authentication");
                self.deck.replace(Vec::new());
                self.load = LoadState::Unauthenticated;
            }
            Err(SupplyError::FetchFailed(message)) => {
                warn!(%message, "job feed fetch failed");
                self.deck.replace(Vec::new());
                self.load = LoadState::Failed(message);
            }
        }
    }

    pub fn view(&self) -> ViewState {
        match &self.load {
            LoadState::Loading => ViewState::Loading,
            LoadState::Unauthenticated => ViewState::Unauthenticated,
            LoadState::Failed(message) => ViewState::SupplyFailed(message.clone()),
            LoadState::Loaded if self.current_card().is_some() => ViewState::Ready,
            LoadState::Loaded => ViewState::Empty,
        }
    }

    pub fn phase(&self) -> CardPhase {
        self.phase
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// The visible card. Cards awaiting confirmation are never current.
    pub fn current_card(&self) -> Option<&Card> {
        if self.load != LoadState::Loaded {
            return None;
        }
        self.deck
            .current()
            .filter(|card| !self.in_flight.contains_key(&card.id))
    }

    pub fn transform(&self) -> CardTransform {
        if self.phase == CardPhase::Dragging {
            CardTransform::for_offset(self.drag.offset, self.settings.rotation_divisor)
        } else {
            CardTransform::AT_REST
        }
    }

    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    pub fn accepted(&self) -> &[AcceptedItem] {
        &self.accepted
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_in_flight(&self, card_id: JobId) -> bool {
        self.in_flight.contains_key(&card_id)
    }

    pub fn feedback_at(&self, now: Instant) -> Option<&Feedback> {
        self.feedback
            .as_ref()
            .filter(|feedback| feedback.is_visible_at(now))
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback_at(Instant::now())
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn pointer_down(&mut self, button: PointerButton, x: f32) {
        self.pointer_down_at(button, x, Instant::now());
    }

    pub fn pointer_down_at(&mut self, button: PointerButton, x: f32, now: Instant) {
        if button != PointerButton::Primary
            || self.phase != CardPhase::Idle
            || self.current_card().is_none()
        {
            return;
        }
        self.drag.begin_at(x, now);
        self.phase = CardPhase::Dragging;
    }

    pub fn pointer_move(&mut self, x: f32) {
        self.pointer_move_at(x, Instant::now());
    }

    pub fn pointer_move_at(&mut self, x: f32, now: Instant) {
        if self.phase == CardPhase::Dragging {
            self.drag.track_at(x, now);
        }
    }

    /// Evaluates the commit policy on release; snaps back when it does not fire.
    pub fn pointer_up(&mut self) -> Option<PendingDecision> {
        self.pointer_up_at(Instant::now())
    }

    pub fn pointer_up_at(&mut self, now: Instant) -> Option<PendingDecision> {
        if self.phase != CardPhase::Dragging {
            return None;
        }
        let (offset, velocity) = self.drag.release_at(now);
        self.phase = CardPhase::Idle;
        match self.settings.policy.evaluate(offset, velocity) {
            Some(verdict) => self.commit_at(verdict, now),
            None => {
                debug!(offset, "swipe below threshold; snapping back");
                None
            }
        }
    }

    /// Pointer capture lost mid-drag is handled exactly like a release.
    pub fn pointer_leave(&mut self) -> Option<PendingDecision> {
        self.pointer_up_at(Instant::now())
    }

    pub fn pointer_leave_at(&mut self, now: Instant) -> Option<PendingDecision> {
        self.pointer_up_at(now)
    }

    /// Drag-end report from a gesture library that tracks velocity itself.
    pub fn fling(&mut self, offset: f32, velocity: f32) -> Option<PendingDecision> {
        if self.phase == CardPhase::Committing {
            return None;
        }
        self.reset_gesture();
        let verdict = self.settings.policy.evaluate(offset, velocity)?;
        self.commit(verdict)
    }

    /// Commits the current card: advances immediately, shows feedback, and returns
    /// the confirmation to send in the background.
    pub fn commit(&mut self, verdict: Verdict) -> Option<PendingDecision> {
        self.commit_at(verdict, Instant::now())
    }

    pub fn commit_at(&mut self, verdict: Verdict, now: Instant) -> Option<PendingDecision> {
        if self.phase == CardPhase::Committing {
            return None;
        }
        let card = self.current_card()?.clone();
        self.reset_gesture();
        self.phase = CardPhase::Committing;

        let decision = PendingDecision {
            card_id: card.id,
            verdict,
        };
        self.in_flight.insert(card.id, InFlight { verdict, card });
        self.skip_in_flight();

        let tone = match verdict {
            Verdict::Accept => FeedbackTone::Accepted,
            Verdict::Reject => FeedbackTone::Declined,
        };
        self.feedback = Some(Feedback {
            text: verdict.feedback_label().to_string(),
            tone,
            expires_at: now + self.settings.feedback_duration,
        });

        debug!(job_id = %decision.card_id, verdict = ?verdict, "decision committed");
        Some(decision)
    }

    /// Ends the exit animation of the last committed card.
    pub fn finish_exit(&mut self) {
        if self.phase == CardPhase::Committing {
            self.phase = CardPhase::Idle;
        }
    }

    /// Applies the background confirmation of a committed decision.
    pub fn settle(&mut self, outcome: DecisionOutcome) {
        self.settle_at(outcome, Instant::now());
    }

    pub fn settle_at(&mut self, outcome: DecisionOutcome, now: Instant) {
        let Some(entry) = self.in_flight.remove(&outcome.card_id) else {
            debug!(job_id = %outcome.card_id, "ignoring settlement for unknown decision");
            return;
        };

        match outcome.result {
            Ok(()) => {
                info!(job_id = %outcome.card_id, verdict = ?entry.verdict, "decision confirmed");
                let removed = self.deck.remove(outcome.card_id);
                if entry.verdict == Verdict::Accept {
                    let card = removed.unwrap_or(entry.card);
                    let target = card.posting.company.as_deref().unwrap_or(&card.posting.title);
                    self.notifications.push(Notification {
                        level: NotificationLevel::Info,
                        message: format!("Application sent to {target}"),
                        card_id: Some(card.id),
                    });
                    self.accepted.push(AcceptedItem {
                        card,
                        status: ApplicationStatus::Applied,
                        accepted_at: Utc::now(),
                    });
                }
            }
            Err(error) => {
                warn!(job_id = %outcome.card_id, %error, "decision failed; card kept in deck");
                let message = error.user_message();
                let level = if error.is_rate_limited() {
                    NotificationLevel::Warning
                } else {
                    NotificationLevel::Error
                };
                self.notifications.push(Notification {
                    level,
                    message: message.clone(),
                    card_id: Some(outcome.card_id),
                });
                self.feedback = Some(Feedback {
                    text: message,
                    tone: FeedbackTone::Failed,
                    expires_at: now + self.settings.feedback_duration,
                });
            }
        }
        self.skip_in_flight();
    }

    /// Starts a fit check for a card unless it is cached or already running.
    /// Returns `None` for cards no longer in the deck.
    pub fn request_fit_check(&mut self, card_id: JobId) -> Option<FitCheckStart> {
        if !self.deck.contains(card_id) {
            return None;
        }
        Some(self.fit_checks.begin(card_id))
    }

    pub fn finish_fit_check(&mut self, card_id: JobId, result: Result<FitReport, AnalysisError>) {
        match self.fit_checks.finish(card_id, result) {
            Ok(report) => {
                if let Some(card) = self.deck.get_mut(card_id) {
                    card.fit = Some(report);
                }
            }
            Err(error) => {
                warn!(job_id = %card_id, %error, "fit check failed");
                self.notifications.push(Notification {
                    level: NotificationLevel::Error,
                    message: error.to_string(),
                    card_id: Some(card_id),
                });
            }
        }
    }

    pub fn is_fit_check_running(&self, card_id: JobId) -> bool {
        self.fit_checks.is_running(card_id)
    }

    fn reset_gesture(&mut self) {
        self.drag.release();
        if self.phase == CardPhase::Dragging {
            self.phase = CardPhase::Idle;
        }
    }

    /// Moves the cursor forward past cards whose decision is still in flight.
    fn skip_in_flight(&mut self) {
        for _ in 0..self.deck.len() {
            let blocked = self
                .deck
                .current()
                .is_some_and(|card| self.in_flight.contains_key(&card.id));
            if !blocked {
                break;
            }
            self.deck.advance(1);
        }
    }
}

#[cfg(test)]
#[path = "../tests/controller_tests.rs"]
mod tests;
