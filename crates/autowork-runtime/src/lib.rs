//! Work-item pipeline for Autowork.
//!
//! Wires chat ingestion, classification and session spawning into poll cycles,
//! and provides the git, agent-process and notification adapters they drive.

pub mod agent_process;
pub mod git_backend;
pub mod notifier;
pub mod pipeline;
pub mod poll_loop;
pub mod resumer;
pub mod spawner;

#[cfg(test)]
mod test_support;

pub use agent_process::{AgentLauncher, AgentProfile, AgentSupervisor, ClaudeCodeAgent, DetachedAgent};
pub use git_backend::{provision_branch, BranchProvision, GitCli, VersionControl};
pub use notifier::{HappyNotifier, NoopNotifier, Notifier};
pub use pipeline::{
    CycleError, MessageOutcome, MessageReport, PipelineState, PollCycleReport, WorkPipeline,
};
pub use poll_loop::{run_poll_loop, PollEvent};
pub use resumer::{resume_session, ResumeError};
pub use spawner::{render_task_prompt, SessionSpawner, SpawnError, SpawnStage};
