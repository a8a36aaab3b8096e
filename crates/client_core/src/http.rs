//! reqwest-backed client for the job board REST API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client, Response, StatusCode};
use shared::{
    domain::{FitReport, JobId, JobPosting, Verdict},
    error::ApiError,
    protocol::{DecisionRequest, FitCheckResponse, JobFeedResponse},
};
use tracing::{debug, warn};

use crate::{
    config::ClientSettings,
    error::{AnalysisError, DecisionError, SupplyError},
    DecisionSink, FitAnalyzer, JobSupply,
};

pub struct JobBoardClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl JobBoardClient {
    pub fn new(settings: &ClientSettings) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            token: settings.token.clone().filter(|token| !token.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[async_trait]
impl JobSupply for JobBoardClient {
    async fn fetch_jobs(&self) -> Result<Vec<JobPosting>, SupplyError> {
        let token = self.token().ok_or(SupplyError::AuthMissing)?;
        let res = self
            .http
            .get(format!("{}/jobs/feed", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| SupplyError::FetchFailed(err.to_string()))?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SupplyError::AuthMissing);
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(SupplyError::FetchFailed(error_message(status, &body)));
        }

        let feed: JobFeedResponse = res
            .json()
            .await
            .map_err(|err| SupplyError::FetchFailed(format!("malformed job feed: {err}")))?;
        debug!(jobs = feed.jobs.len(), "fetched job feed");
        Ok(feed.jobs)
    }
}

#[async_trait]
impl DecisionSink for JobBoardClient {
    async fn submit(&self, job_id: JobId, verdict: Verdict) -> Result<(), DecisionError> {
        let token = self
            .token()
            .ok_or_else(|| DecisionError::permission_denied("not signed in"))?;
        let res = self
            .http
            .post(format!("{}/jobs/{job_id}/decision", self.base_url))
            .bearer_auth(token)
            .json(&DecisionRequest { verdict })
            .send()
            .await
            .map_err(|err| DecisionError::other(err.to_string()))?;

        if res.status().is_success() {
            return Ok(());
        }
        let err = decision_failure(res).await;
        warn!(%job_id, ?verdict, error = %err, "backend rejected decision");
        Err(err)
    }
}

#[async_trait]
impl FitAnalyzer for JobBoardClient {
    async fn analyze(&self, job_id: JobId) -> Result<FitReport, AnalysisError> {
        let token = self
            .token()
            .ok_or_else(|| AnalysisError("not signed in".into()))?;
        let res = self
            .http
            .post(format!("{}/jobs/{job_id}/fit-check", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| AnalysisError(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AnalysisError(error_message(status, &body)));
        }
        let body: FitCheckResponse = res
            .json()
            .await
            .map_err(|err| AnalysisError(format!("malformed fit check response: {err}")))?;
        Ok(body.report)
    }
}

async fn decision_failure(res: Response) -> DecisionError {
    let status = res.status();
    let retry_after = res
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = res.text().await.unwrap_or_default();
    classify_decision_failure(status, retry_after.as_deref(), &body)
}

/// Maps a non-success decision response onto the failure taxonomy.
pub fn classify_decision_failure(
    status: StatusCode,
    retry_after: Option<&str>,
    body: &str,
) -> DecisionError {
    let api_error = serde_json::from_str::<ApiError>(body).ok();
    let message = api_error
        .as_ref()
        .map(|err| err.message.clone())
        .unwrap_or_else(|| error_message(status, body));

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let wait = retry_after
                .and_then(parse_retry_after)
                .or_else(|| {
                    api_error
                        .as_ref()
                        .and_then(|err| err.retry_after_seconds)
                        .map(Duration::from_secs)
                });
            DecisionError::rate_limited(message, wait)
        }
        StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
            DecisionError::permission_denied(message)
        }
        _ => DecisionError::other(message),
    }
}

/// `Retry-After` in delta-seconds form.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(api_error) = serde_json::from_str::<ApiError>(body) {
        return api_error.message;
    }
    let body = body.trim();
    if body.is_empty() {
        format!("request failed with status {status}")
    } else {
        format!("request failed with status {status}: {body}")
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
