use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer};

use crate::agent_process::{AgentLauncher, DetachedAgent};
use crate::git_backend::VersionControl;
use crate::notifier::Notifier;

pub(crate) fn git(repo: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args([
            "-c",
            "user.email=autowork@example.com",
            "-c",
            "user.name=autowork",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(repo)
        .output()
        .expect("run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Creates `root/name` as a git repository with one empty commit.
pub(crate) fn init_git_repo(root: &Path, name: &str) -> PathBuf {
    let repo = root.join(name);
    std::fs::create_dir_all(&repo).expect("create repo dir");
    git(&repo, &["init", "-q"]);
    git(&repo, &["commit", "--allow-empty", "-q", "-m", "init"]);
    repo
}

pub(crate) fn current_branch(repo: &Path) -> String {
    git(repo, &["rev-parse", "--abbrev-ref", "HEAD"])
}

#[cfg(unix)]
pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join(name);
    std::fs::write(&script, format!("#!/bin/sh\nset -eu\n{body}\n")).expect("write script");
    let mut perms = std::fs::metadata(&script)
        .expect("script metadata")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).expect("chmod script");
    script
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LaunchRecord {
    pub repo_path: PathBuf,
    pub prompt: String,
    pub log_path: PathBuf,
}

#[derive(Default)]
pub(crate) struct FakeLauncher {
    failure: Option<String>,
    launches: Mutex<Vec<LaunchRecord>>,
    interactive: Mutex<Vec<PathBuf>>,
}

impl FakeLauncher {
    pub(crate) fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn launches(&self) -> Vec<LaunchRecord> {
        self.launches.lock().expect("launches lock").clone()
    }

    pub(crate) fn interactive_runs(&self) -> Vec<PathBuf> {
        self.interactive.lock().expect("interactive lock").clone()
    }
}

#[async_trait]
impl AgentLauncher for FakeLauncher {
    async fn launch_detached(
        &self,
        repo_path: &Path,
        prompt: &str,
        log_path: &Path,
    ) -> Result<DetachedAgent> {
        if let Some(message) = &self.failure {
            return Err(anyhow!(message.clone()));
        }
        self.launches
            .lock()
            .expect("launches lock")
            .push(LaunchRecord {
                repo_path: repo_path.to_path_buf(),
                prompt: prompt.to_string(),
                log_path: log_path.to_path_buf(),
            });
        Ok(DetachedAgent::untracked(None))
    }

    async fn run_interactive(&self, repo_path: &Path) -> Result<()> {
        if let Some(message) = &self.failure {
            return Err(anyhow!(message.clone()));
        }
        self.interactive
            .lock()
            .expect("interactive lock")
            .push(repo_path.to_path_buf());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    fail: bool,
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("messages lock").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        if self.fail {
            return Err(anyhow!("notification service unavailable"));
        }
        self.messages
            .lock()
            .expect("messages lock")
            .push(message.to_string());
        Ok(())
    }
}

pub(crate) struct FailingVersionControl {
    message: String,
}

impl FailingVersionControl {
    pub(crate) fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl VersionControl for FailingVersionControl {
    async fn refresh_remotes(&self, _repo_path: &Path) -> Result<()> {
        Err(anyhow!("no remotes"))
    }

    async fn branch_exists(&self, _repo_path: &Path, _branch: &str) -> Result<bool> {
        Ok(false)
    }

    async fn create_branch(&self, _repo_path: &Path, _branch: &str) -> Result<()> {
        Err(anyhow!(self.message.clone()))
    }

    async fn checkout(&self, _repo_path: &Path, _branch: &str) -> Result<()> {
        Err(anyhow!(self.message.clone()))
    }
}

/// Tracing layer that keeps every event's fields, keyed by field name.
#[derive(Clone, Default)]
pub(crate) struct CapturedEvents {
    events: Arc<Mutex<Vec<BTreeMap<String, String>>>>,
}

impl CapturedEvents {
    pub(crate) fn with_message(&self, message: &str) -> Vec<BTreeMap<String, String>> {
        self.events
            .lock()
            .expect("events lock")
            .iter()
            .filter(|fields| fields.get("message").map(String::as_str) == Some(message))
            .cloned()
            .collect()
    }
}

#[derive(Default)]
struct FieldRecorder {
    fields: BTreeMap<String, String>,
}

impl Visit for FieldRecorder {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.fields
            .insert(field.name().to_string(), format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }
}

impl<S: tracing::Subscriber> Layer<S> for CapturedEvents {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut recorder = FieldRecorder::default();
        event.record(&mut recorder);
        self.events
            .lock()
            .expect("events lock")
            .push(recorder.fields);
    }
}
