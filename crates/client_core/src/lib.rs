//! Headless swipe deck for the job feed: gesture handling, optimistic commits,
//! and background confirmation against the job board backend.

use async_trait::async_trait;
use shared::domain::{FitReport, JobId, JobPosting, Verdict};

pub mod config;
pub mod controller;
pub mod deck;
pub mod error;
pub mod fit_check;
pub mod gesture;
pub mod http;
pub mod session;

pub use controller::DeckController;
pub use error::{AnalysisError, DecisionError, DecisionFailureKind, SupplyError};
pub use http::JobBoardClient;
pub use session::{DeckSession, SessionEvent};

/// Source of the ordered job feed.
#[async_trait]
pub trait JobSupply: Send + Sync {
    async fn fetch_jobs(&self) -> Result<Vec<JobPosting>, SupplyError>;
}

/// Durable recording of a swipe decision. Called concurrently for different cards.
#[async_trait]
pub trait DecisionSink: Send + Sync {
    async fn submit(&self, job_id: JobId, verdict: Verdict) -> Result<(), DecisionError>;
}

#[async_trait]
pub trait FitAnalyzer: Send + Sync {
    async fn analyze(&self, job_id: JobId) -> Result<FitReport, AnalysisError>;
}

pub struct MissingFitAnalyzer;

#[async_trait]
impl FitAnalyzer for MissingFitAnalyzer {
    async fn analyze(&self, _job_id: JobId) -> Result<FitReport, AnalysisError> {
        Err(AnalysisError("fit check is not available".into()))
    }
}
