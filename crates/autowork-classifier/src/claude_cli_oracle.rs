use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use autowork_core::{spawn_with_text_file_busy_retry, truncate_chars};
use tokio::process::Command;

use crate::classifier::ClassificationOracle;

const FAILURE_SUMMARY_MAX_CHARS: usize = 240;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaudeCliOracleConfig {
    pub executable: String,
    pub model: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Oracle backed by a non-interactive `claude --print` invocation.
pub struct ClaudeCliOracle {
    config: ClaudeCliOracleConfig,
}

impl ClaudeCliOracle {
    pub fn new(config: ClaudeCliOracleConfig) -> Result<Self> {
        if config.executable.trim().is_empty() {
            bail!("classifier executable is empty");
        }
        if config.model.trim().is_empty() {
            bail!("classifier model is empty");
        }
        if config.timeout_ms == 0 {
            bail!("classifier timeout must be greater than 0ms");
        }
        Ok(Self { config })
    }
}

#[async_trait]
impl ClassificationOracle for ClaudeCliOracle {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut command = Command::new(&self.config.executable);
        command.kill_on_drop(true);
        command.arg("--print");
        command.arg("--model");
        command.arg(&self.config.model);
        command.arg(prompt);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        let child = spawn_with_text_file_busy_retry(&mut command, &self.config.executable)
            .await
            .context("classifier could not be started")?;

        let output = tokio::time::timeout(
            Duration::from_millis(self.config.timeout_ms),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| anyhow!("classifier timed out after {}ms", self.config.timeout_ms))?
        .map_err(|error| anyhow!("classifier process failed: {error}"))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !output.status.success() {
            let status = output
                .status
                .code()
                .map(|value| value.to_string())
                .unwrap_or_else(|| "signal".to_string());
            bail!(
                "claude CLI error (status {status}): {}",
                summarize_process_failure(&stderr, &stdout)
            );
        }

        tracing::debug!(
            executable = %self.config.executable,
            model = %self.config.model,
            stdout_bytes = output.stdout.len(),
            "classifier completed"
        );
        Ok(stdout)
    }
}

fn summarize_process_failure(stderr: &str, stdout: &str) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return truncate_chars(stderr, FAILURE_SUMMARY_MAX_CHARS);
    }

    let stdout = stdout.trim();
    if !stdout.is_empty() {
        return truncate_chars(stdout, FAILURE_SUMMARY_MAX_CHARS);
    }

    "no error output".to_string()
}
