//! `config.json` model: Slack credentials, repository root, watched channels and
//! collaborator tuning knobs.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use autowork_core::{load_json_document, save_private_json_document};
use serde::{Deserialize, Serialize};

const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";
const DEFAULT_HISTORY_LIMIT: u32 = 50;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_RETRY_MAX_ATTEMPTS: usize = 3;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;
const DEFAULT_CLASSIFIER_EXECUTABLE: &str = "claude";
const DEFAULT_CLASSIFIER_MODEL: &str = "sonnet";
const DEFAULT_CLASSIFIER_TIMEOUT_MS: u64 = 180_000;
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 300;

fn default_slack_api_base() -> String {
    DEFAULT_SLACK_API_BASE.to_string()
}

fn default_history_limit() -> u32 {
    DEFAULT_HISTORY_LIMIT
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_retry_max_attempts() -> usize {
    DEFAULT_RETRY_MAX_ATTEMPTS
}

fn default_retry_base_delay_ms() -> u64 {
    DEFAULT_RETRY_BASE_DELAY_MS
}

fn default_classifier_executable() -> String {
    DEFAULT_CLASSIFIER_EXECUTABLE.to_string()
}

fn default_classifier_model() -> String {
    DEFAULT_CLASSIFIER_MODEL.to_string()
}

fn default_classifier_timeout_ms() -> u64 {
    DEFAULT_CLASSIFIER_TIMEOUT_MS
}

fn default_poll_interval_seconds() -> u64 {
    DEFAULT_POLL_INTERVAL_SECONDS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Persisted watcher configuration loaded at the start of every command.
pub struct AutoworkConfig {
    pub slack_token: String,
    pub slack_cookie: String,
    pub repos_dir: PathBuf,
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
    #[serde(default)]
    pub channel_ids: Vec<String>,
    #[serde(default = "default_slack_api_base")]
    pub slack_api_base: String,
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: usize,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_classifier_executable")]
    pub classifier_executable: String,
    #[serde(default = "default_classifier_model")]
    pub classifier_model: String,
    #[serde(default = "default_classifier_timeout_ms")]
    pub classifier_timeout_ms: u64,
}

impl AutoworkConfig {
    /// Builds a config with default tuning values for the given required fields.
    pub fn new(
        slack_token: impl Into<String>,
        slack_cookie: impl Into<String>,
        repos_dir: impl Into<PathBuf>,
        channel_ids: Vec<String>,
    ) -> Self {
        Self {
            slack_token: slack_token.into(),
            slack_cookie: slack_cookie.into(),
            repos_dir: repos_dir.into(),
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            channel_ids,
            slack_api_base: default_slack_api_base(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            retry_max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            classifier_executable: default_classifier_executable(),
            classifier_model: default_classifier_model(),
            classifier_timeout_ms: DEFAULT_CLASSIFIER_TIMEOUT_MS,
        }
    }

    /// Channel ids in configuration order with blanks removed.
    pub fn watched_channels(&self) -> Vec<String> {
        self.channel_ids
            .iter()
            .map(|channel| channel.trim())
            .filter(|channel| !channel.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.slack_token.trim().is_empty() {
            bail!("config slack_token must not be empty");
        }
        if self.slack_cookie.trim().is_empty() {
            bail!("config slack_cookie must not be empty");
        }
        if self.repos_dir.as_os_str().is_empty() {
            bail!("config repos_dir must not be empty");
        }
        if self.poll_interval_seconds == 0 {
            bail!("config poll_interval_seconds must be greater than 0");
        }
        if self.watched_channels().is_empty() {
            bail!("config channel_ids must list at least one channel");
        }
        if self.slack_api_base.trim().is_empty() {
            bail!("config slack_api_base must not be empty");
        }
        if self.classifier_executable.trim().is_empty() {
            bail!("config classifier_executable must not be empty");
        }
        Ok(())
    }
}

/// Loads and validates `config.json`; a missing file is an error pointing at `autowork config`.
pub fn load_config(path: &Path) -> Result<AutoworkConfig> {
    let config = load_json_document::<AutoworkConfig>(path)?.with_context(|| {
        format!(
            "config not found at {}, run 'autowork config' first",
            path.display()
        )
    })?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    tracing::debug!(
        config = %path.display(),
        channels = config.watched_channels().len(),
        repos_dir = %config.repos_dir.display(),
        "loaded watcher config"
    );
    Ok(config)
}

/// Validates and writes `config.json`, readable by the owner only on unix.
pub fn save_config(path: &Path, config: &AutoworkConfig) -> Result<()> {
    config.validate()?;
    save_private_json_document(path, config)
}
