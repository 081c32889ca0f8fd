use std::process::Stdio;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use autowork_core::spawn_with_text_file_busy_retry;
use tokio::process::Command;

#[async_trait]
/// Push-notification channel fired after a successful spawn.
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _message: &str) -> Result<()> {
        Ok(())
    }
}

/// Sends `happy notify -p <message>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HappyNotifier {
    executable: String,
}

impl Default for HappyNotifier {
    fn default() -> Self {
        Self::new("happy")
    }
}

impl HappyNotifier {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

#[async_trait]
impl Notifier for HappyNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let mut command = Command::new(&self.executable);
        command
            .args(["notify", "-p", message])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let mut child = spawn_with_text_file_busy_retry(&mut command, &self.executable).await?;
        let status = child
            .wait()
            .await
            .with_context(|| format!("failed to run {} notify", self.executable))?;
        if !status.success() {
            bail!("{} notify exited with {status}", self.executable);
        }
        Ok(())
    }
}
