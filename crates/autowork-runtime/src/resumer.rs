use std::path::PathBuf;

use autowork_session::Session;
use thiserror::Error;

use crate::agent_process::AgentLauncher;
use crate::git_backend::VersionControl;

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("branch {branch} no longer exists in {}", repo_path.display())]
    BranchMissing { branch: String, repo_path: PathBuf },
    #[error("failed to checkout branch {branch}: {message}")]
    Checkout { branch: String, message: String },
    #[error("agent session failed: {0}")]
    Agent(String),
}

/// Checks out the session's branch and runs the agent interactively in resume
/// mode. Blocks until the agent exits.
pub async fn resume_session(
    session: &Session,
    vcs: &dyn VersionControl,
    launcher: &dyn AgentLauncher,
) -> Result<(), ResumeError> {
    let checkout_error = |error: anyhow::Error| ResumeError::Checkout {
        branch: session.branch.clone(),
        message: format!("{error:#}"),
    };

    if !vcs
        .branch_exists(&session.repo_path, &session.branch)
        .await
        .map_err(checkout_error)?
    {
        return Err(ResumeError::BranchMissing {
            branch: session.branch.clone(),
            repo_path: session.repo_path.clone(),
        });
    }
    vcs.checkout(&session.repo_path, &session.branch)
        .await
        .map_err(checkout_error)?;

    tracing::debug!(
        session_id = %session.id,
        repo = %session.repo_path.display(),
        branch = %session.branch,
        "resuming agent session"
    );
    launcher
        .run_interactive(&session.repo_path)
        .await
        .map_err(|error| ResumeError::Agent(format!("{error:#}")))
}
