//! Turns an actionable verdict into a running, recorded agent session.
//!
//! A spawn walks `Verifying -> BranchReady -> ProcessLaunched -> Recorded`.
//! Each failure stops the walk where it happened:
//!
//! - a missing repository mutates nothing;
//! - a branch failure leaves the working tree as git left it;
//! - a launch failure keeps the provisioned branch for reuse;
//! - a persist failure leaves the agent running unrecorded, with its prompt and
//!   log files under `active_sessions/` as the trail back to it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use autowork_classifier::ActionableTask;
use autowork_core::write_text_atomic;
use autowork_session::{Session, SessionRegistry};
use chrono::Utc;
use thiserror::Error;

use crate::agent_process::{AgentLauncher, AgentSupervisor};
use crate::git_backend::{provision_branch, VersionControl};
use crate::notifier::Notifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnStage {
    Verifying,
    BranchReady,
    ProcessLaunched,
    Recorded,
}

impl SpawnStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verifying => "verifying",
            Self::BranchReady => "branch_ready",
            Self::ProcessLaunched => "process_launched",
            Self::Recorded => "recorded",
        }
    }
}

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("repo not found: {}", path.display())]
    RepoMissing { repo: String, path: PathBuf },
    #[error("failed to create branch {branch}: {message}")]
    Branch { branch: String, message: String },
    #[error("failed to start agent session: {0}")]
    Launch(String),
    #[error("failed to save session {session_id}: {message}")]
    Persist { session_id: String, message: String },
}

/// Renders the task prompt handed to a freshly launched agent.
pub fn render_task_prompt(summary: &str, originating_message: &str) -> String {
    format!(
        r#"You have been assigned this task from a Slack message:

Task: {summary}

Original message: "{originating_message}"

Please analyze the codebase and work on this task. When you're done with initial analysis and have a plan, stop and wait for the user to continue the session."#
    )
}

pub struct SessionSpawner {
    repos_dir: PathBuf,
    active_sessions_dir: PathBuf,
    vcs: Arc<dyn VersionControl>,
    launcher: Arc<dyn AgentLauncher>,
    notifier: Arc<dyn Notifier>,
}

impl SessionSpawner {
    pub fn new(
        repos_dir: PathBuf,
        active_sessions_dir: PathBuf,
        vcs: Arc<dyn VersionControl>,
        launcher: Arc<dyn AgentLauncher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            repos_dir,
            active_sessions_dir,
            vcs,
            launcher,
            notifier,
        }
    }

    pub fn repos_dir(&self) -> &Path {
        &self.repos_dir
    }

    pub async fn spawn(
        &self,
        task: &ActionableTask,
        originating_message: &str,
        registry: &mut SessionRegistry,
        supervisor: &mut AgentSupervisor,
    ) -> Result<Session, SpawnError> {
        let session_id = registry
            .allocate_id()
            .map_err(|error| SpawnError::Launch(error.to_string()))?;
        let repo_path = self.repos_dir.join(&task.repo);
        log_stage(SpawnStage::Verifying, &session_id, task, None);
        if !repo_path.is_dir() {
            return Err(SpawnError::RepoMissing {
                repo: task.repo.clone(),
                path: repo_path,
            });
        }

        let provision = provision_branch(self.vcs.as_ref(), &repo_path, &task.branch)
            .await
            .map_err(|error| SpawnError::Branch {
                branch: task.branch.clone(),
                message: format!("{error:#}"),
            })?;
        log_stage(
            SpawnStage::BranchReady,
            &session_id,
            task,
            Some(provision.as_str()),
        );

        let prompt = render_task_prompt(&task.summary, originating_message);
        let prompt_path = self.active_sessions_dir.join(format!("{session_id}.prompt"));
        let log_path = self.active_sessions_dir.join(format!("{session_id}.log"));
        write_text_atomic(&prompt_path, &prompt)
            .map_err(|error| SpawnError::Launch(format!("{error:#}")))?;
        let agent = self
            .launcher
            .launch_detached(&repo_path, &prompt, &log_path)
            .await
            .map_err(|error| SpawnError::Launch(format!("{error:#}")))?;
        supervisor.adopt(&session_id, agent);
        log_stage(SpawnStage::ProcessLaunched, &session_id, task, None);

        let session = Session {
            id: session_id.clone(),
            repo: task.repo.clone(),
            branch: task.branch.clone(),
            summary: task.summary.clone(),
            repo_path,
            created_at: Utc::now(),
            originating_message: originating_message.to_string(),
        };
        if let Err(error) = registry.append(session.clone()) {
            tracing::warn!(
                session_id = %session_id,
                prompt = %prompt_path.display(),
                log = %log_path.display(),
                error = %error,
                "agent is running but its session was not recorded"
            );
            return Err(SpawnError::Persist {
                session_id,
                message: error.to_string(),
            });
        }
        log_stage(SpawnStage::Recorded, &session.id, task, None);

        let notification = format!("New session: {} - {}", session.repo, session.summary);
        if let Err(error) = self.notifier.notify(&notification).await {
            tracing::debug!(session_id = %session.id, error = %format!("{error:#}"), "notification skipped");
        }
        Ok(session)
    }
}

fn log_stage(
    stage: SpawnStage,
    session_id: &str,
    task: &ActionableTask,
    provision: Option<&'static str>,
) {
    tracing::info!(
        session_id = %session_id,
        repo = %task.repo,
        branch = %task.branch,
        stage = stage.as_str(),
        provision,
        "spawn stage reached"
    );
}
