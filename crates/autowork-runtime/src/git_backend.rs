//! Version-control collaborator used for branch provisioning and resume.
//!
//! Shells out to the `git` CLI in the repository's working directory.

use std::path::Path;
use std::process::Output;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Refreshes remote-tracking state. Callers treat failures as non-fatal.
    async fn refresh_remotes(&self, repo_path: &Path) -> Result<()>;
    /// Whether a local branch named `branch` exists.
    async fn branch_exists(&self, repo_path: &Path, branch: &str) -> Result<bool>;
    /// Creates `branch` from the current HEAD and checks it out in one call.
    async fn create_branch(&self, repo_path: &Path, branch: &str) -> Result<()>;
    async fn checkout(&self, repo_path: &Path, branch: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchProvision {
    Reused,
    Created,
}

impl BranchProvision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reused => "reused",
            Self::Created => "created",
        }
    }
}

/// Leaves `branch` checked out in `repo_path`, creating it when absent.
///
/// Calling this twice with the same arguments succeeds both times; the second
/// call only checks the branch out.
pub async fn provision_branch(
    vcs: &dyn VersionControl,
    repo_path: &Path,
    branch: &str,
) -> Result<BranchProvision> {
    if let Err(error) = vcs.refresh_remotes(repo_path).await {
        tracing::debug!(
            repo = %repo_path.display(),
            error = %format!("{error:#}"),
            "remote refresh skipped"
        );
    }

    if vcs.branch_exists(repo_path, branch).await? {
        vcs.checkout(repo_path, branch).await?;
        return Ok(BranchProvision::Reused);
    }
    vcs.create_branch(repo_path, branch).await?;
    Ok(BranchProvision::Created)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCli {
    executable: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            executable: "git".to_string(),
        }
    }
}

impl GitCli {
    async fn run(&self, repo_path: &Path, args: &[&str]) -> Result<Output> {
        Command::new(&self.executable)
            .args(args)
            .current_dir(repo_path)
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .with_context(|| format!("failed to run git {}", args.join(" ")))
    }

    async fn run_checked(&self, repo_path: &Path, args: &[&str]) -> Result<()> {
        let output = self.run(repo_path, args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let diagnostic = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            bail!("git {} failed: {diagnostic}", args.join(" "));
        }
        Ok(())
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn refresh_remotes(&self, repo_path: &Path) -> Result<()> {
        self.run_checked(repo_path, &["fetch", "--all"]).await
    }

    async fn branch_exists(&self, repo_path: &Path, branch: &str) -> Result<bool> {
        let reference = format!("refs/heads/{branch}");
        let output = self
            .run(repo_path, &["rev-parse", "--verify", "--quiet", &reference])
            .await?;
        Ok(output.status.success())
    }

    async fn create_branch(&self, repo_path: &Path, branch: &str) -> Result<()> {
        self.run_checked(repo_path, &["checkout", "-b", branch]).await
    }

    async fn checkout(&self, repo_path: &Path, branch: &str) -> Result<()> {
        self.run_checked(repo_path, &["checkout", branch]).await
    }
}
