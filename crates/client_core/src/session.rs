//! Runs a [`DeckController`] against live collaborators. Decisions are confirmed in
//! spawned tokio tasks so navigation never waits on the network.

use std::sync::Arc;

use shared::domain::{FitReport, JobId, Verdict};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, warn};

use crate::{
    controller::{ControllerSettings, DecisionOutcome, DeckController, PendingDecision},
    error::{AnalysisError, DecisionError},
    fit_check::FitCheckStart,
    gesture::PointerButton,
    DecisionSink, FitAnalyzer, JobSupply,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    DecisionSettled(DecisionOutcome),
    FitCheckFinished {
        card_id: JobId,
        result: Result<FitReport, AnalysisError>,
    },
}

pub struct DeckSession {
    controller: DeckController,
    supply: Arc<dyn JobSupply>,
    sink: Arc<dyn DecisionSink>,
    analyzer: Arc<dyn FitAnalyzer>,
    permits: Arc<Semaphore>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    outstanding: usize,
}

impl DeckSession {
    pub fn new(
        settings: ControllerSettings,
        max_in_flight_decisions: usize,
        supply: Arc<dyn JobSupply>,
        sink: Arc<dyn DecisionSink>,
        analyzer: Arc<dyn FitAnalyzer>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            controller: DeckController::new(settings),
            supply,
            sink,
            analyzer,
            permits: Arc::new(Semaphore::new(max_in_flight_decisions.max(1))),
            events_tx,
            events_rx,
            outstanding: 0,
        }
    }

    pub fn controller(&self) -> &DeckController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut DeckController {
        &mut self.controller
    }

    /// Background tasks (decisions and fit checks) not yet applied.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub async fn refresh(&mut self) {
        self.controller.begin_refresh();
        let result = self.supply.fetch_jobs().await;
        self.controller.load(result);
    }

    pub fn pointer_down(&mut self, button: PointerButton, x: f32) {
        self.controller.pointer_down(button, x);
    }

    pub fn pointer_move(&mut self, x: f32) {
        self.controller.pointer_move(x);
    }

    pub fn pointer_up(&mut self) -> bool {
        let decision = self.controller.pointer_up();
        self.enqueue(decision)
    }

    pub fn pointer_leave(&mut self) -> bool {
        let decision = self.controller.pointer_leave();
        self.enqueue(decision)
    }

    pub fn fling(&mut self, offset: f32, velocity: f32) -> bool {
        let decision = self.controller.fling(offset, velocity);
        self.enqueue(decision)
    }

    pub fn commit(&mut self, verdict: Verdict) -> bool {
        let decision = self.controller.commit(verdict);
        self.enqueue(decision)
    }

    pub fn finish_exit(&mut self) {
        self.controller.finish_exit();
    }

    /// Starts the fit check for the current card. Returns false on a cache hit or
    /// when a check for that card is already running.
    pub fn request_fit_check(&mut self) -> bool {
        let Some(card_id) = self.controller.current_card().map(|card| card.id) else {
            return false;
        };
        match self.controller.request_fit_check(card_id) {
            Some(FitCheckStart::Started) => {}
            Some(FitCheckStart::Cached(_)) | Some(FitCheckStart::AlreadyRunning) | None => {
                debug!(job_id = %card_id, "fit check skipped");
                return false;
            }
        }

        let analyzer = Arc::clone(&self.analyzer);
        let events_tx = self.events_tx.clone();
        self.outstanding += 1;
        tokio::spawn(async move {
            let work = tokio::spawn(async move { analyzer.analyze(card_id).await });
            let result = match work.await {
                Ok(result) => result,
                Err(join_error) => {
                    warn!(job_id = %card_id, %join_error, "fit check task aborted");
                    Err(AnalysisError(format!("fit check task failed: {join_error}")))
                }
            };
            if events_tx
                .send(SessionEvent::FitCheckFinished { card_id, result })
                .is_err()
            {
                warn!(job_id = %card_id, "session dropped before fit check finished");
            }
        });
        true
    }

    /// Applies every event that has already arrived without waiting.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Waits for the next background event and applies it.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        if self.outstanding == 0 {
            return None;
        }
        let event = self.events_rx.recv().await?;
        self.apply(event.clone());
        Some(event)
    }

    pub async fn settle_all(&mut self) {
        while self.next_event().await.is_some() {}
    }

    fn enqueue(&mut self, decision: Option<PendingDecision>) -> bool {
        let Some(decision) = decision else {
            return false;
        };
        let sink = Arc::clone(&self.sink);
        let permits = Arc::clone(&self.permits);
        let events_tx = self.events_tx.clone();
        self.outstanding += 1;
        debug!(job_id = %decision.card_id, verdict = ?decision.verdict, "queued decision");

        tokio::spawn(async move {
            let work = tokio::spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|_| DecisionError::other("decision queue closed"))?;
                sink.submit(decision.card_id, decision.verdict).await
            });
            let outcome = match work.await {
                Ok(Ok(())) => DecisionOutcome::confirmed(decision),
                Ok(Err(error)) => DecisionOutcome::failed(decision, error),
                Err(join_error) => {
                    warn!(job_id = %decision.card_id, %join_error, "decision task aborted");
                    DecisionOutcome::failed(
                        decision,
                        DecisionError::other(format!("decision task failed: {join_error}")),
                    )
                }
            };
            if events_tx.send(SessionEvent::DecisionSettled(outcome)).is_err() {
                warn!(job_id = %decision.card_id, "session dropped before decision settled");
            }
        });
        true
    }

    fn apply(&mut self, event: SessionEvent) {
        self.outstanding = self.outstanding.saturating_sub(1);
        match event {
            SessionEvent::DecisionSettled(outcome) => self.controller.settle(outcome),
            SessionEvent::FitCheckFinished { card_id, result } => {
                self.controller.finish_fit_check(card_id, result)
            }
        }
    }
}
