//! Client settings: defaults, `feed.toml`, then environment overrides.

use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

use crate::{
    controller::{ControllerSettings, DEFAULT_FEEDBACK_DURATION},
    gesture::{
        CommitPolicy, DEFAULT_COMMIT_THRESHOLD_PX, DEFAULT_ROTATION_DIVISOR,
        DEFAULT_SWIPE_CONFIDENCE,
    },
};

pub const DEFAULT_CONFIG_FILE: &str = "feed.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Manual pointer capture, fixed distance threshold.
    Distance,
    /// Gesture-library flings, offset times velocity.
    SwipePower,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub api_url: String,
    pub token: Option<String>,
    pub commit_mode: CommitMode,
    pub commit_threshold_px: f32,
    pub swipe_confidence: f32,
    pub rotation_divisor: f32,
    pub feedback_ms: u64,
    pub max_in_flight_decisions: usize,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000/api".into(),
            token: None,
            commit_mode: CommitMode::Distance,
            commit_threshold_px: DEFAULT_COMMIT_THRESHOLD_PX,
            swipe_confidence: DEFAULT_SWIPE_CONFIDENCE,
            rotation_divisor: DEFAULT_ROTATION_DIVISOR,
            feedback_ms: DEFAULT_FEEDBACK_DURATION.as_millis() as u64,
            max_in_flight_decisions: 4,
            request_timeout_secs: 20,
        }
    }
}

impl ClientSettings {
    pub fn commit_policy(&self) -> CommitPolicy {
        match self.commit_mode {
            CommitMode::Distance => CommitPolicy::Distance {
                threshold: self.commit_threshold_px,
            },
            CommitMode::SwipePower => CommitPolicy::SwipePower {
                confidence: self.swipe_confidence,
            },
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            policy: self.commit_policy(),
            rotation_divisor: self.rotation_divisor,
            feedback_duration: Duration::from_millis(self.feedback_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Defaults, then the TOML file (if present), then environment overrides.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => parse_settings(&raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => ClientSettings::default(),
        Err(error) => {
            return Err(error)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    validate(&settings)?;
    Ok(settings)
}

pub fn parse_settings(raw: &str) -> anyhow::Result<ClientSettings> {
    Ok(toml::from_str::<ClientSettings>(raw)?)
}

pub fn apply_env_overrides(settings: &mut ClientSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("JOBFEED_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = lookup("JOBFEED_TOKEN") {
        settings.token = Some(v);
    }
    if let Some(v) = lookup("APP__TOKEN") {
        settings.token = Some(v);
    }

    if let Some(v) = lookup("APP__COMMIT_MODE") {
        match v.to_ascii_lowercase().as_str() {
            "distance" => settings.commit_mode = CommitMode::Distance,
            "swipe_power" | "swipe-power" => settings.commit_mode = CommitMode::SwipePower,
            _ => {}
        }
    }

    if let Some(parsed) = lookup("APP__COMMIT_THRESHOLD_PX").and_then(|v| v.parse().ok()) {
        settings.commit_threshold_px = parsed;
    }
    if let Some(parsed) = lookup("APP__SWIPE_CONFIDENCE").and_then(|v| v.parse().ok()) {
        settings.swipe_confidence = parsed;
    }
    if let Some(parsed) = lookup("APP__FEEDBACK_MS").and_then(|v| v.parse().ok()) {
        settings.feedback_ms = parsed;
    }
    if let Some(parsed) = lookup("APP__MAX_IN_FLIGHT").and_then(|v| v.parse().ok()) {
        settings.max_in_flight_decisions = parsed;
    }
    if let Some(parsed) = lookup("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        settings.request_timeout_secs = parsed;
    }
}

fn validate(settings: &ClientSettings) -> anyhow::Result<()> {
    url::Url::parse(&settings.api_url)
        .with_context(|| format!("invalid api_url '{}'", settings.api_url))?;
    if settings.max_in_flight_decisions == 0 {
        anyhow::bail!("max_in_flight_decisions must be at least 1");
    }
    if !settings.commit_threshold_px.is_finite() || settings.commit_threshold_px < 0.0 {
        anyhow::bail!(
            "commit_threshold_px must be a non-negative number, got {}",
            settings.commit_threshold_px
        );
    }
    if !settings.swipe_confidence.is_finite() || settings.swipe_confidence < 0.0 {
        anyhow::bail!(
            "swipe_confidence must be a non-negative number, got {}",
            settings.swipe_confidence
        );
    }
    if !settings.rotation_divisor.is_finite() {
        anyhow::bail!("rotation_divisor must be finite");
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
