//! Coding-agent process launcher and background reaper.

use std::fs::OpenOptions;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use autowork_core::spawn_with_text_file_busy_retry;
use tokio::process::{Child, Command};
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Front-end used to run the coding agent.
pub enum AgentProfile {
    #[default]
    ClaudeCode,
    /// Happy Coder: exposes sessions in a remote UI.
    HappyCoder,
}

impl AgentProfile {
    pub fn from_happy_flag(happy: bool) -> Self {
        if happy {
            Self::HappyCoder
        } else {
            Self::ClaudeCode
        }
    }

    pub fn executable(self) -> &'static str {
        match self {
            Self::ClaudeCode => "claude",
            Self::HappyCoder => "happy",
        }
    }
}

/// Handle to an agent that was started in the background.
#[derive(Debug)]
pub struct DetachedAgent {
    pid: Option<u32>,
    child: Option<Child>,
}

impl DetachedAgent {
    pub fn from_child(child: Child) -> Self {
        Self {
            pid: child.id(),
            child: Some(child),
        }
    }

    /// A handle with nothing to reap.
    pub fn untracked(pid: Option<u32>) -> Self {
        Self { pid, child: None }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

#[async_trait]
pub trait AgentLauncher: Send + Sync {
    /// Starts a non-interactive agent on `prompt` and returns without waiting.
    /// Combined stdout/stderr are appended to `log_path`.
    async fn launch_detached(
        &self,
        repo_path: &Path,
        prompt: &str,
        log_path: &Path,
    ) -> Result<DetachedAgent>;

    /// Runs the agent in resume mode on the caller's terminal until it exits.
    async fn run_interactive(&self, repo_path: &Path) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaudeCodeAgent {
    executable: String,
}

impl ClaudeCodeAgent {
    pub fn new(profile: AgentProfile) -> Self {
        Self::with_executable(profile.executable())
    }

    pub fn with_executable(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }
}

#[async_trait]
impl AgentLauncher for ClaudeCodeAgent {
    async fn launch_detached(
        &self,
        repo_path: &Path,
        prompt: &str,
        log_path: &Path,
    ) -> Result<DetachedAgent> {
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .with_context(|| format!("failed to open agent log {}", log_path.display()))?;
        let stderr_file = log_file
            .try_clone()
            .context("failed to clone agent log handle")?;

        let mut command = Command::new(&self.executable);
        command.arg("--print");
        command.arg(prompt);
        command.current_dir(repo_path);
        command.stdin(Stdio::null());
        command.stdout(Stdio::from(log_file));
        command.stderr(Stdio::from(stderr_file));
        #[cfg(unix)]
        command.process_group(0);

        let child = spawn_with_text_file_busy_retry(&mut command, &self.executable).await?;
        let agent = DetachedAgent::from_child(child);
        tracing::debug!(
            executable = %self.executable,
            repo = %repo_path.display(),
            pid = ?agent.pid(),
            log = %log_path.display(),
            "agent launched in background"
        );
        Ok(agent)
    }

    async fn run_interactive(&self, repo_path: &Path) -> Result<()> {
        let mut command = Command::new(&self.executable);
        command.arg("--resume");
        command.current_dir(repo_path);
        command.stdin(Stdio::inherit());
        command.stdout(Stdio::inherit());
        command.stderr(Stdio::inherit());

        let mut child = spawn_with_text_file_busy_retry(&mut command, &self.executable).await?;
        let status = child
            .wait()
            .await
            .with_context(|| format!("failed to wait for {}", self.executable))?;
        if !status.success() {
            bail!("{} exited with {}", self.executable, describe_exit(status));
        }
        Ok(())
    }
}

fn describe_exit(status: ExitStatus) -> String {
    status
        .code()
        .map(|code| format!("status {code}"))
        .unwrap_or_else(|| "a signal".to_string())
}

/// Best-effort reaper for detached agents.
///
/// Exit statuses are only logged; they never flow back into the pipeline.
#[derive(Debug, Default)]
pub struct AgentSupervisor {
    waits: JoinSet<(String, std::io::Result<ExitStatus>)>,
}

impl AgentSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes over reaping of `agent`. Untracked handles are ignored.
    pub fn adopt(&mut self, session_id: &str, agent: DetachedAgent) {
        let Some(mut child) = agent.child else {
            return;
        };
        let session_id = session_id.to_string();
        self.waits.spawn(async move {
            let status = child.wait().await;
            (session_id, status)
        });
    }

    /// Number of adopted agents not yet collected.
    pub fn tracked(&self) -> usize {
        self.waits.len()
    }

    /// Collects agents that have already exited and returns how many were reaped.
    pub fn reap_finished(&mut self) -> usize {
        let mut reaped = 0;
        while let Some(joined) = self.waits.try_join_next() {
            reaped += 1;
            match joined {
                Ok((session_id, Ok(status))) => {
                    tracing::debug!(session_id = %session_id, status = %describe_exit(status), "agent exited");
                }
                Ok((session_id, Err(error))) => {
                    tracing::debug!(session_id = %session_id, error = %error, "agent wait failed");
                }
                Err(error) => {
                    tracing::debug!(error = %error, "agent wait task failed");
                }
            }
        }
        reaped
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::tempdir;

    use super::{AgentLauncher, AgentProfile, AgentSupervisor, ClaudeCodeAgent, DetachedAgent};
    #[cfg(unix)]
    use crate::test_support::write_script;

    #[test]
    fn unit_agent_profile_selects_executable() {
        assert_eq!(AgentProfile::from_happy_flag(false).executable(), "claude");
        assert_eq!(AgentProfile::from_happy_flag(true).executable(), "happy");
        assert_eq!(
            ClaudeCodeAgent::new(AgentProfile::HappyCoder).executable(),
            "happy"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn integration_launch_detached_writes_log_in_repo_cwd() {
        let temp = tempdir().expect("tempdir");
        let repo = temp.path().join("repo");
        std::fs::create_dir_all(&repo).expect("repo dir");
        let script = write_script(
            temp.path(),
            "mock-agent.sh",
            r#"
echo "args: $1 | $2"
echo "cwd: $(pwd)"
echo "to stderr" >&2
"#,
        );
        let log_path = temp.path().join("session.log");
        let agent = ClaudeCodeAgent::with_executable(script.display().to_string());

        let handle = agent
            .launch_detached(&repo, "do the task", &log_path)
            .await
            .expect("launch");
        assert!(handle.pid().is_some());

        let mut supervisor = AgentSupervisor::new();
        supervisor.adopt("abcd1234", handle);
        assert_eq!(supervisor.tracked(), 1);

        let mut reaped = 0;
        for _ in 0..100 {
            reaped += supervisor.reap_finished();
            if reaped == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(reaped, 1);
        assert_eq!(supervisor.tracked(), 0);

        let log = std::fs::read_to_string(&log_path).expect("log");
        assert!(log.contains("args: --print | do the task"), "{log}");
        assert!(log.contains("cwd: "), "{log}");
        assert!(log.contains("/repo"), "{log}");
        assert!(log.contains("to stderr"), "{log}");
    }

    #[tokio::test]
    async fn regression_launch_detached_reports_missing_executable() {
        let temp = tempdir().expect("tempdir");
        let agent = ClaudeCodeAgent::with_executable(
            temp.path().join("no-such-agent").display().to_string(),
        );
        let error = agent
            .launch_detached(temp.path(), "prompt", &temp.path().join("x.log"))
            .await
            .expect_err("missing executable");
        assert!(error.to_string().contains("failed to spawn"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn integration_run_interactive_passes_resume_and_reports_exit_status() {
        let temp = tempdir().expect("tempdir");
        let ok_script = write_script(
            temp.path(),
            "ok-agent.sh",
            r#"[ "$1" = "--resume" ] || exit 9"#,
        );
        ClaudeCodeAgent::with_executable(ok_script.display().to_string())
            .run_interactive(temp.path())
            .await
            .expect("resume ok");

        let failing = write_script(temp.path(), "bad-agent.sh", "exit 4");
        let error = ClaudeCodeAgent::with_executable(failing.display().to_string())
            .run_interactive(temp.path())
            .await
            .expect_err("non-zero exit");
        assert!(error.to_string().contains("exited with status 4"));
    }

    #[test]
    fn unit_supervisor_ignores_untracked_agents() {
        let mut supervisor = AgentSupervisor::new();
        supervisor.adopt("deadbeef", DetachedAgent::untracked(Some(42)));
        assert_eq!(supervisor.tracked(), 0);
    }
}
