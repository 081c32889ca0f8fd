//! Plain-text renderers for command output.

use autowork_core::{format_local_minute, truncate_chars};
use autowork_runtime::{CycleError, MessageOutcome, PollCycleReport};
use autowork_session::Session;

const MESSAGE_PREVIEW_CHARS: usize = 50;

pub(crate) fn render_cycle_banner(clock: &str) -> String {
    format!("[{clock}] Checking for new messages...")
}

pub(crate) fn render_start_banner(poll_interval_seconds: u64) -> String {
    format!(
        "Starting autowork daemon (polling every {poll_interval_seconds} seconds)\nPress Ctrl+C to stop\n"
    )
}

pub(crate) fn render_cycle_error(error: &CycleError) -> String {
    match error {
        CycleError::Transport(error) => format!("Error fetching messages: {error}"),
    }
}

pub(crate) fn render_cycle_report(report: &PollCycleReport) -> String {
    let mut lines = Vec::new();
    if let Some(error) = &report.state_save_error {
        lines.push(format!("Error saving state: {error}"));
    }
    if report.messages.is_empty() {
        lines.push("No new messages".to_string());
        return lines.join("\n");
    }

    lines.push(format!("Found {} new messages", report.messages.len()));
    for entry in &report.messages {
        lines.push(String::new());
        lines.push(format!(
            "Processing: {}",
            truncate_chars(&entry.message.text, MESSAGE_PREVIEW_CHARS)
        ));
        match &entry.outcome {
            MessageOutcome::NotActionable => {
                lines.push("  -> Not actionable, skipping".to_string());
            }
            MessageOutcome::ClassificationFailed(error) => {
                lines.push(format!("  Classification error: {error}"));
            }
            MessageOutcome::SpawnFailed { task, error } => {
                lines.push(format!(
                    "  -> Actionable! Repo: {}, Branch: {}",
                    task.repo, task.branch
                ));
                lines.push(format!("  -> Summary: {}", task.summary));
                lines.push(format!("  -> Error spawning session: {error}"));
            }
            MessageOutcome::SessionStarted(session) => {
                lines.push(format!(
                    "  -> Actionable! Repo: {}, Branch: {}",
                    session.repo, session.branch
                ));
                lines.push(format!("  -> Summary: {}", session.summary));
                lines.push(format!("  -> Session started: {}", session.id));
            }
        }
    }
    lines.join("\n")
}

pub(crate) fn render_session_list(sessions: &[Session]) -> String {
    if sessions.is_empty() {
        return "No pending sessions".to_string();
    }

    let mut lines = vec!["Pending work sessions:".to_string(), String::new()];
    for session in sessions {
        lines.push(format!(
            "  [{}] {}/{}",
            session.id, session.repo, session.branch
        ));
        lines.push(format!("        {}", session.summary));
        lines.push(format!(
            "        Created: {}",
            format_local_minute(&session.created_at)
        ));
        lines.push(String::new());
    }
    lines.push("Run 'autowork open <id>' to resume a session".to_string());
    lines.join("\n")
}

pub(crate) fn render_resume_banner(session: &Session) -> String {
    format!(
        "Resuming session in {} on branch {}\nTask: {}\n",
        session.repo_path.display(),
        session.branch,
        session.summary
    )
}
