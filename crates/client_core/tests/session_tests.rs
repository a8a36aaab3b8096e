use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use client_core::{
    controller::{ControllerSettings, ViewState},
    error::{AnalysisError, DecisionError, SupplyError},
    gesture::PointerButton,
    DeckSession, DecisionSink, FitAnalyzer, JobSupply, MissingFitAnalyzer,
};
use shared::domain::{FitReport, JobId, JobPosting, Verdict};
use tokio::sync::{Mutex, Notify};

struct StaticSupply {
    result: Mutex<Result<Vec<JobPosting>, SupplyError>>,
    calls: AtomicUsize,
}

impl StaticSupply {
    fn jobs(ids: &[i64]) -> Arc<Self> {
        let jobs = ids
            .iter()
            .map(|id| JobPosting::new(JobId(*id), format!("Role {id}")))
            .collect();
        Arc::new(Self {
            result: Mutex::new(Ok(jobs)),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(err: SupplyError) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Err(err)),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl JobSupply for StaticSupply {
    async fn fetch_jobs(&self) -> Result<Vec<JobPosting>, SupplyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.lock().await.clone()
    }
}

#[derive(Default)]
struct RecordingSink {
    submitted: Mutex<Vec<(JobId, Verdict)>>,
    failures: HashMap<JobId, DecisionError>,
    gate: Option<Arc<Notify>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl DecisionSink for RecordingSink {
    async fn submit(&self, job_id: JobId, verdict: Verdict) -> Result<(), DecisionError> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);
        self.submitted.lock().await.push((job_id, verdict));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
        match self.failures.get(&job_id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

struct PanickingBackend;

#[async_trait]
impl DecisionSink for PanickingBackend {
    async fn submit(&self, job_id: JobId, _verdict: Verdict) -> Result<(), DecisionError> {
        panic!("sink crashed while recording {job_id}");
    }
}

#[async_trait]
impl FitAnalyzer for PanickingBackend {
    async fn analyze(&self, job_id: JobId) -> Result<FitReport, AnalysisError> {
        panic!("analyzer crashed on {job_id}");
    }
}

#[derive(Default)]
struct CountingAnalyzer {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl FitAnalyzer for CountingAnalyzer {
    async fn analyze(&self, _job_id: JobId) -> Result<FitReport, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        if self.fail {
            return Err(AnalysisError("model unavailable".into()));
        }
        Ok(FitReport {
            score: 8,
            summary: "good fit".into(),
            strengths: Vec::new(),
            gaps: Vec::new(),
        })
    }
}

fn session(
    supply: Arc<StaticSupply>,
    sink: Arc<RecordingSink>,
    analyzer: Arc<dyn FitAnalyzer>,
    max_in_flight: usize,
) -> DeckSession {
    DeckSession::new(
        ControllerSettings::default(),
        max_in_flight,
        supply,
        sink,
        analyzer,
    )
}

fn deck_ids(session: &DeckSession) -> Vec<i64> {
    session
        .controller()
        .deck()
        .cards()
        .iter()
        .map(|card| card.id.0)
        .collect()
}

fn current(session: &DeckSession) -> Option<JobId> {
    session.controller().current_card().map(|card| card.id)
}

#[tokio::test]
async fn navigation_does_not_wait_for_pending_decision() {
    let gate = Arc::new(Notify::new());
    let sink = Arc::new(RecordingSink {
        gate: Some(Arc::clone(&gate)),
        ..RecordingSink::default()
    });
    let mut session = session(
        StaticSupply::jobs(&[1, 2, 3]),
        Arc::clone(&sink),
        Arc::new(MissingFitAnalyzer),
        4,
    );
    session.refresh().await;

    session.pointer_down(PointerButton::Primary, 0.0);
    session.pointer_move(140.0);
    assert!(session.pointer_up());
    assert_eq!(current(&session), Some(JobId(2)));
    assert_eq!(deck_ids(&session), vec![1, 2, 3]);

    gate.notify_one();
    session.settle_all().await;
    assert_eq!(deck_ids(&session), vec![2, 3]);
    let accepted: Vec<_> = session
        .controller()
        .accepted()
        .iter()
        .map(|item| item.card.id)
        .collect();
    assert_eq!(accepted, vec![JobId(1)]);
    assert_eq!(
        sink.submitted.lock().await.clone(),
        vec![(JobId(1), Verdict::Accept)]
    );
}

#[tokio::test]
async fn failed_decision_keeps_card_and_surfaces_wait_time() {
    let mut failures = HashMap::new();
    failures.insert(
        JobId(1),
        DecisionError::rate_limited("too many swipes", Some(Duration::from_secs(240))),
    );
    let sink = Arc::new(RecordingSink {
        failures,
        ..RecordingSink::default()
    });
    let mut session = session(
        StaticSupply::jobs(&[1]),
        Arc::clone(&sink),
        Arc::new(MissingFitAnalyzer),
        4,
    );
    session.refresh().await;

    assert!(session.commit(Verdict::Reject));
    assert_eq!(session.controller().view(), ViewState::Empty);
    session.settle_all().await;
    session.finish_exit();

    assert_eq!(deck_ids(&session), vec![1]);
    assert_eq!(current(&session), Some(JobId(1)));
    let notifications = session.controller_mut().take_notifications();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].message.contains("4 minutes"));
    assert_eq!(sink.submitted.lock().await.len(), 1);
}

#[tokio::test]
async fn in_flight_decisions_are_capped() {
    let gate = Arc::new(Notify::new());
    let sink = Arc::new(RecordingSink {
        gate: Some(Arc::clone(&gate)),
        ..RecordingSink::default()
    });
    let mut session = session(
        StaticSupply::jobs(&[1, 2, 3, 4, 5]),
        Arc::clone(&sink),
        Arc::new(MissingFitAnalyzer),
        2,
    );
    session.refresh().await;

    for _ in 0..5 {
        assert!(session.commit(Verdict::Reject));
        session.finish_exit();
    }
    assert_eq!(session.outstanding(), 5);
    assert_eq!(session.controller().view(), ViewState::Empty);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sink.submitted.lock().await.len(), 2);

    for _ in 0..5 {
        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    session.settle_all().await;

    assert!(sink.peak.load(Ordering::SeqCst) <= 2);
    assert!(deck_ids(&session).is_empty());
    assert_eq!(session.outstanding(), 0);
}

#[tokio::test]
async fn fit_check_is_requested_once_per_card() {
    let analyzer = Arc::new(CountingAnalyzer::default());
    let mut session = session(
        StaticSupply::jobs(&[1, 2]),
        Arc::new(RecordingSink::default()),
        analyzer.clone(),
        4,
    );
    session.refresh().await;

    assert!(session.request_fit_check());
    assert!(!session.request_fit_check());
    session.settle_all().await;
    assert!(!session.request_fit_check());

    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
    let fit = session
        .controller()
        .current_card()
        .and_then(|card| card.fit.clone())
        .expect("cached report");
    assert_eq!(fit.score, 8);
}

#[tokio::test]
async fn failed_fit_check_can_be_retried() {
    let analyzer = Arc::new(CountingAnalyzer {
        fail: true,
        ..CountingAnalyzer::default()
    });
    let mut session = session(
        StaticSupply::jobs(&[1]),
        Arc::new(RecordingSink::default()),
        analyzer.clone(),
        4,
    );
    session.refresh().await;

    assert!(session.request_fit_check());
    session.settle_all().await;
    assert_eq!(session.controller_mut().take_notifications().len(), 1);
    assert!(session.request_fit_check());
    session.settle_all().await;
    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn missing_auth_shows_unauthenticated_view() {
    let supply = StaticSupply::failing(SupplyError::AuthMissing);
    let mut session = session(
        supply.clone(),
        Arc::new(RecordingSink::default()),
        Arc::new(MissingFitAnalyzer),
        4,
    );
    session.refresh().await;
    assert_eq!(session.controller().view(), ViewState::Unauthenticated);
    assert!(!session.commit(Verdict::Accept));

    *supply.result.lock().await = Err(SupplyError::FetchFailed("timeout".into()));
    session.refresh().await;
    assert_eq!(
        session.controller().view(),
        ViewState::SupplyFailed("timeout".into())
    );
    assert_eq!(supply.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn panicking_sink_settles_as_failure_and_returns_card() {
    let mut session = DeckSession::new(
        ControllerSettings::default(),
        4,
        StaticSupply::jobs(&[1, 2]),
        Arc::new(PanickingBackend),
        Arc::new(MissingFitAnalyzer),
    );
    session.refresh().await;

    assert!(session.commit(Verdict::Accept));
    session.finish_exit();
    assert!(session.commit(Verdict::Reject));
    session.finish_exit();
    assert_eq!(session.controller().view(), ViewState::Empty);

    tokio::time::timeout(Duration::from_secs(2), session.settle_all())
        .await
        .expect("every decision settles");

    assert_eq!(session.outstanding(), 0);
    assert_eq!(session.controller().in_flight_count(), 0);
    assert_eq!(deck_ids(&session), vec![1, 2]);
    assert_eq!(session.controller().view(), ViewState::Ready);
    let notifications = session.controller_mut().take_notifications();
    assert_eq!(notifications.len(), 2);
    assert!(notifications
        .iter()
        .all(|n| n.message.contains("decision task failed")));
}

#[tokio::test]
async fn panicking_analyzer_leaves_fit_check_retryable() {
    let mut session = DeckSession::new(
        ControllerSettings::default(),
        4,
        StaticSupply::jobs(&[1]),
        Arc::new(RecordingSink::default()),
        Arc::new(PanickingBackend),
    );
    session.refresh().await;

    assert!(session.request_fit_check());
    tokio::time::timeout(Duration::from_secs(2), session.settle_all())
        .await
        .expect("fit check settles");
    assert_eq!(session.outstanding(), 0);
    assert_eq!(session.controller_mut().take_notifications().len(), 1);
    assert!(session.request_fit_check());
}

#[tokio::test]
async fn dropping_session_mid_fit_check_lets_task_finish_quietly() {
    let analyzer = Arc::new(CountingAnalyzer::default());
    let mut session = session(
        StaticSupply::jobs(&[1]),
        Arc::new(RecordingSink::default()),
        analyzer.clone(),
        4,
    );
    session.refresh().await;

    assert!(session.request_fit_check());
    drop(session);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
}
