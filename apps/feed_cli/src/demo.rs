//! In-memory job board used by `--demo`, mirroring the marketing page deck.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use client_core::{
    error::{AnalysisError, DecisionError, SupplyError},
    DecisionSink, FitAnalyzer, JobSupply,
};
use shared::domain::{EmploymentKind, FitReport, JobId, JobPosting, Verdict};
use tracing::info;

pub struct DemoBoard {
    latency: Duration,
    fail_every: Option<usize>,
    decisions: AtomicUsize,
}

impl DemoBoard {
    pub fn new(latency: Duration, fail_every: Option<usize>) -> Self {
        Self {
            latency,
            fail_every: fail_every.filter(|n| *n > 0),
            decisions: AtomicUsize::new(0),
        }
    }
}

fn sample_jobs() -> Vec<JobPosting> {
    let mut jobs = vec![
        JobPosting::new(JobId(101), "Senior Rust Engineer")
            .with_company("Ferrous Systems Lab")
            .with_location("Berlin")
            .with_tags(["rust", "tokio", "postgres"]),
        JobPosting::new(JobId(102), "Backend Developer")
            .with_company("Parcel Loop")
            .with_location("Remote")
            .with_tags(["go", "grpc"]),
        JobPosting::new(JobId(103), "Platform Engineer")
            .with_company("Northwind Cloud")
            .with_location("Toronto")
            .with_tags(["kubernetes", "terraform"]),
        JobPosting::new(JobId(104), "Frontend Engineer")
            .with_company("Brightline")
            .with_location("Lisbon")
            .with_tags(["typescript", "react"]),
    ];
    jobs[0].employment = Some(EmploymentKind::FullTime);
    jobs[1].remote = true;
    jobs[3].employment = Some(EmploymentKind::Contract);
    jobs
}

#[async_trait]
impl JobSupply for DemoBoard {
    async fn fetch_jobs(&self) -> Result<Vec<JobPosting>, SupplyError> {
        tokio::time::sleep(self.latency).await;
        Ok(sample_jobs())
    }
}

#[async_trait]
impl DecisionSink for DemoBoard {
    async fn submit(&self, job_id: JobId, verdict: Verdict) -> Result<(), DecisionError> {
        tokio::time::sleep(self.latency).await;
        let n = self.decisions.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_every.is_some_and(|every| n % every == 0) {
            return Err(DecisionError::rate_limited(
                "demo swipe limit reached",
                Some(Duration::from_secs(120)),
            ));
        }
        info!(%job_id, ?verdict, "demo decision recorded");
        Ok(())
    }
}

#[async_trait]
impl FitAnalyzer for DemoBoard {
    async fn analyze(&self, job_id: JobId) -> Result<FitReport, AnalysisError> {
        tokio::time::sleep(self.latency).await;
        let job = sample_jobs()
            .into_iter()
            .find(|job| job.id == job_id)
            .ok_or_else(|| AnalysisError(format!("unknown job {job_id}")))?;
        let rust = job.tags.iter().any(|tag| tag == "rust");
        Ok(FitReport {
            score: if rust { 9 } else { 5 },
            summary: format!("{} looks like a {} match", job.title, if rust { "strong" } else { "partial" }),
            strengths: job.tags.iter().take(2).cloned().collect(),
            gaps: if rust { Vec::new() } else { vec!["rust".into()] },
        })
    }
}
