//! Orchestrator configuration.
//!
//! Values can come from code (`with_*` setters), from JSON via
//! [`OrchestratorConfig::from_json`], or from `STAGESTREAM_*` environment
//! variables via [`OrchestratorConfig::from_env`]. Runners and responders
//! validate whatever they are given.

use crate::errors::StagestreamError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happens to the pipeline runner when the client goes away mid-job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectPolicy {
    /// Let the runner finish detached so the artifact is still persisted.
    CompleteInBackground,
    /// Abort the runner task; no artifact is written.
    Abandon,
}

impl Default for DisconnectPolicy {
    fn default() -> Self {
        Self::CompleteInBackground
    }
}

impl std::str::FromStr for DisconnectPolicy {
    type Err = StagestreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "complete_in_background" | "complete" | "background" => Ok(Self::CompleteInBackground),
            "abandon" | "abort" => Ok(Self::Abandon),
            other => Err(StagestreamError::Config(format!(
                "unknown disconnect policy '{other}'"
            ))),
        }
    }
}

/// Configuration for the job coordinator and pipeline runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Seconds between keep-alive heartbeats.
    ///
    /// Must be shorter than any idle-connection timeout between the server
    /// and the client.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: f64,
    /// Maximum number of independent stages executing at once.
    #[serde(default = "default_max_concurrent_stages")]
    pub max_concurrent_stages: usize,
    /// Per-stage executor timeout in seconds (`None` waits indefinitely).
    #[serde(default)]
    pub stage_timeout_seconds: Option<f64>,
    /// Whether to emit a `progress` event after each completed stage.
    #[serde(default)]
    pub emit_progress: bool,
    /// How many prior artifacts feed the history context.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// How many characters of each prior report appear in the history context.
    #[serde(default = "default_history_prefix_chars")]
    pub history_prefix_chars: usize,
    /// What to do with the runner when the client disconnects.
    #[serde(default)]
    pub disconnect_policy: DisconnectPolicy,
}

fn default_heartbeat_interval() -> f64 {
    15.0
}

fn default_max_concurrent_stages() -> usize {
    1
}

fn default_history_limit() -> usize {
    2
}

fn default_history_prefix_chars() -> usize {
    150
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_seconds: default_heartbeat_interval(),
            max_concurrent_stages: default_max_concurrent_stages(),
            stage_timeout_seconds: None,
            emit_progress: false,
            history_limit: default_history_limit(),
            history_prefix_chars: default_history_prefix_chars(),
            disconnect_policy: DisconnectPolicy::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the configuration from `STAGESTREAM_*` environment variables.
    ///
    /// Unset variables keep their defaults. Recognized variables:
    /// `STAGESTREAM_HEARTBEAT_SECONDS`, `STAGESTREAM_MAX_CONCURRENT_STAGES`,
    /// `STAGESTREAM_STAGE_TIMEOUT_SECONDS`, `STAGESTREAM_EMIT_PROGRESS`,
    /// `STAGESTREAM_HISTORY_LIMIT`, `STAGESTREAM_HISTORY_PREFIX_CHARS`,
    /// `STAGESTREAM_DISCONNECT_POLICY`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a variable cannot be parsed or the
    /// result fails [`OrchestratorConfig::validate`].
    pub fn from_env() -> Result<Self, StagestreamError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`OrchestratorConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StagestreamError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("STAGESTREAM_HEARTBEAT_SECONDS") {
            config.heartbeat_interval_seconds = parse_var("STAGESTREAM_HEARTBEAT_SECONDS", &v)?;
        }
        if let Some(v) = lookup("STAGESTREAM_MAX_CONCURRENT_STAGES") {
            config.max_concurrent_stages = parse_var("STAGESTREAM_MAX_CONCURRENT_STAGES", &v)?;
        }
        if let Some(v) = lookup("STAGESTREAM_STAGE_TIMEOUT_SECONDS") {
            config.stage_timeout_seconds =
                Some(parse_var("STAGESTREAM_STAGE_TIMEOUT_SECONDS", &v)?);
        }
        if let Some(v) = lookup("STAGESTREAM_EMIT_PROGRESS") {
            config.emit_progress = parse_var("STAGESTREAM_EMIT_PROGRESS", &v)?;
        }
        if let Some(v) = lookup("STAGESTREAM_HISTORY_LIMIT") {
            config.history_limit = parse_var("STAGESTREAM_HISTORY_LIMIT", &v)?;
        }
        if let Some(v) = lookup("STAGESTREAM_HISTORY_PREFIX_CHARS") {
            config.history_prefix_chars = parse_var("STAGESTREAM_HISTORY_PREFIX_CHARS", &v)?;
        }
        if let Some(v) = lookup("STAGESTREAM_DISCONNECT_POLICY") {
            config.disconnect_policy = v.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON configuration document and validates it.
    ///
    /// Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a serialization error for malformed JSON, or a configuration
    /// error if the values fail [`OrchestratorConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, StagestreamError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval_seconds = interval.as_secs_f64();
        self
    }

    /// Sets the maximum stage fan-out.
    #[must_use]
    pub fn with_max_concurrent_stages(mut self, max: usize) -> Self {
        self.max_concurrent_stages = max;
        self
    }

    /// Sets the per-stage timeout.
    #[must_use]
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout_seconds = Some(timeout.as_secs_f64());
        self
    }

    /// Enables or disables per-stage progress events.
    #[must_use]
    pub fn with_progress_events(mut self, enabled: bool) -> Self {
        self.emit_progress = enabled;
        self
    }

    /// Sets how many prior artifacts feed the history context.
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Sets the disconnect policy.
    #[must_use]
    pub fn with_disconnect_policy(mut self, policy: DisconnectPolicy) -> Self {
        self.disconnect_policy = policy;
        self
    }

    /// Returns the heartbeat interval as a `Duration`.
    ///
    /// Values that fail [`OrchestratorConfig::validate`] fall back to the
    /// default interval.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.heartbeat_interval_seconds)
            .ok()
            .filter(|interval| !interval.is_zero())
            .unwrap_or_else(|| Duration::from_secs_f64(default_heartbeat_interval()))
    }

    /// Returns the stage timeout as a `Duration`.
    ///
    /// A negative or non-finite value reads as no timeout.
    #[must_use]
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_seconds
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Checks that the values are usable.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a non-positive heartbeat interval or
    /// stage timeout, or a zero stage fan-out.
    pub fn validate(&self) -> Result<(), StagestreamError> {
        if !(self.heartbeat_interval_seconds.is_finite() && self.heartbeat_interval_seconds > 0.0)
        {
            return Err(StagestreamError::Config(
                "heartbeat interval must be a positive number of seconds".to_string(),
            ));
        }
        if self.max_concurrent_stages == 0 {
            return Err(StagestreamError::Config(
                "max_concurrent_stages must be at least 1".to_string(),
            ));
        }
        if let Some(timeout) = self.stage_timeout_seconds {
            if !(timeout.is_finite() && timeout > 0.0) {
                return Err(StagestreamError::Config(
                    "stage timeout must be a positive number of seconds".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, StagestreamError> {
    value
        .trim()
        .parse()
        .map_err(|_| StagestreamError::Config(format!("invalid value '{value}' for {key}")))
}
