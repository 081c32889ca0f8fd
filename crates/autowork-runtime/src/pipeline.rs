//! One poll cycle: ingest, persist watermarks, classify, spawn.

use std::sync::Arc;

use autowork_classifier::{
    discover_repositories, ActionableTask, ClassificationError, ClassificationOracle, Classifier,
    Verdict,
};
use autowork_session::{Session, SessionRegistry};
use autowork_slack_runtime::{fetch_new, ChatMessage, ChatTransport, TransportError, WatermarkStore};
use thiserror::Error;

use crate::agent_process::AgentSupervisor;
use crate::spawner::SessionSpawner;

/// Mutable state threaded through every cycle of one invocation.
pub struct PipelineState {
    pub watermarks: WatermarkStore,
    pub registry: SessionRegistry,
    pub supervisor: AgentSupervisor,
}

impl PipelineState {
    pub fn new(watermarks: WatermarkStore, registry: SessionRegistry) -> Self {
        Self {
            watermarks,
            registry,
            supervisor: AgentSupervisor::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    NotActionable,
    ClassificationFailed(String),
    SpawnFailed { task: ActionableTask, error: String },
    SessionStarted(Session),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageReport {
    pub message: ChatMessage,
    pub outcome: MessageOutcome,
}

/// Per-message outcomes of one cycle, in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollCycleReport {
    /// Set when the advanced watermarks could not be written; the batch is
    /// still processed.
    pub state_save_error: Option<String>,
    pub messages: Vec<MessageReport>,
}

impl PollCycleReport {
    pub fn sessions_started(&self) -> usize {
        self.messages
            .iter()
            .filter(|report| matches!(report.outcome, MessageOutcome::SessionStarted(_)))
            .count()
    }

    pub fn failures(&self) -> usize {
        self.messages
            .iter()
            .filter(|report| {
                matches!(
                    report.outcome,
                    MessageOutcome::ClassificationFailed(_) | MessageOutcome::SpawnFailed { .. }
                )
            })
            .count()
    }
}

/// A cycle-level failure. Per-message failures are reported, not raised.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub struct WorkPipeline<O> {
    transport: Arc<dyn ChatTransport>,
    channel_ids: Vec<String>,
    classifier: Classifier<O>,
    spawner: SessionSpawner,
}

impl<O: ClassificationOracle> WorkPipeline<O> {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        channel_ids: Vec<String>,
        classifier: Classifier<O>,
        spawner: SessionSpawner,
    ) -> Self {
        Self {
            transport,
            channel_ids,
            classifier,
            spawner,
        }
    }

    /// Runs one full cycle. Messages are handled strictly one after another.
    ///
    /// Watermarks are saved right after ingestion, before any classification,
    /// so a crash later in the cycle never re-delivers this batch. A failed save
    /// is recorded in the report and the batch is still handled, since the
    /// in-memory watermarks have already moved past it.
    pub async fn run_cycle(&self, state: &mut PipelineState) -> Result<PollCycleReport, CycleError> {
        let reaped = state.supervisor.reap_finished();
        if reaped > 0 {
            tracing::debug!(reaped, still_running = state.supervisor.tracked(), "reaped agents");
        }

        let batch = fetch_new(
            self.transport.as_ref(),
            &self.channel_ids,
            &mut state.watermarks,
        )
        .await?;
        let mut report = PollCycleReport::default();
        if let Err(error) = state.watermarks.save() {
            let message = format!("{error:#}");
            tracing::warn!(error = %message, "failed to save watermarks");
            report.state_save_error = Some(message);
        }
        tracing::debug!(messages = batch.len(), "poll batch ingested");

        for message in batch {
            let outcome = self.process_message(&message, state).await;
            report.messages.push(MessageReport { message, outcome });
        }
        Ok(report)
    }

    async fn process_message(&self, message: &ChatMessage, state: &mut PipelineState) -> MessageOutcome {
        let verdict = match self.classify(&message.text).await {
            Ok(verdict) => verdict,
            Err(error) => {
                tracing::warn!(
                    channel = %message.channel,
                    timestamp = %message.timestamp,
                    error = %error,
                    "classification failed"
                );
                return MessageOutcome::ClassificationFailed(error.to_string());
            }
        };

        let task = match verdict {
            Verdict::NotActionable => return MessageOutcome::NotActionable,
            Verdict::Actionable(task) => task,
        };

        match self
            .spawner
            .spawn(
                &task,
                &message.text,
                &mut state.registry,
                &mut state.supervisor,
            )
            .await
        {
            Ok(session) => MessageOutcome::SessionStarted(session),
            Err(error) => {
                tracing::warn!(
                    channel = %message.channel,
                    timestamp = %message.timestamp,
                    repo = %task.repo,
                    branch = %task.branch,
                    error = %error,
                    "spawn failed"
                );
                MessageOutcome::SpawnFailed {
                    task,
                    error: error.to_string(),
                }
            }
        }
    }

    async fn classify(&self, text: &str) -> Result<Verdict, ClassificationError> {
        let known_repos = discover_repositories(self.spawner.repos_dir())
            .map_err(|error| ClassificationError::RepoDiscovery(format!("{error:#}")))?;
        self.classifier.classify(text, &known_repos).await
    }
}
