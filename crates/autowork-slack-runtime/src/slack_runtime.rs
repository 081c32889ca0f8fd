//! Chat collaborator contract and the message ingestion step.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod slack_api_client;
mod slack_helpers;
mod watermark_store;

pub use slack_api_client::{SlackApiClient, SlackApiClientConfig, MAX_HISTORY_PAGES};
pub use watermark_store::{WatermarkStore, WATERMARK_STATE_SCHEMA_VERSION};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One human-authored chat message awaiting classification.
pub struct ChatMessage {
    pub channel: String,
    pub author: String,
    pub text: String,
    pub timestamp: String,
}

#[async_trait]
/// Stateless chat history source.
///
/// Implementations return only messages strictly newer than `watermark`, oldest
/// first, with bot and system entries already removed. An empty watermark means
/// "from the beginning" within the source's own paging limits.
pub trait ChatTransport: Send + Sync {
    async fn fetch(&self, channel_id: &str, watermark: &str) -> anyhow::Result<Vec<ChatMessage>>;
}

#[derive(Debug, Error)]
/// A channel fetch failed; the poll cycle is aborted.
pub enum TransportError {
    #[error("error fetching channel {channel}: {message}")]
    Fetch { channel: String, message: String },
}

impl TransportError {
    pub fn channel(&self) -> &str {
        match self {
            Self::Fetch { channel, .. } => channel,
        }
    }
}

/// Pulls unseen messages for every watched channel, in configuration order.
///
/// Each channel's watermark is advanced to the newest timestamp in its batch as
/// soon as that channel's fetch succeeds. When a fetch fails the whole batch is
/// dropped: the failing channel and every channel after it keep their previous
/// watermark, while channels fetched earlier in this call keep the advanced one.
/// The caller persists `watermarks` after a successful return.
pub async fn fetch_new(
    transport: &dyn ChatTransport,
    channel_ids: &[String],
    watermarks: &mut WatermarkStore,
) -> Result<Vec<ChatMessage>, TransportError> {
    let mut batch = Vec::new();
    for channel_id in channel_ids {
        let watermark = watermarks.watermark(channel_id).to_string();
        let messages = transport
            .fetch(channel_id, &watermark)
            .await
            .map_err(|error| TransportError::Fetch {
                channel: channel_id.clone(),
                message: format!("{error:#}"),
            })?;

        for message in &messages {
            watermarks.advance(channel_id, &message.timestamp);
        }
        tracing::debug!(
            channel = %channel_id,
            previous_watermark = %watermark,
            watermark = %watermarks.watermark(channel_id),
            fetched = messages.len(),
            "channel history fetched"
        );
        batch.extend(messages);
    }
    Ok(batch)
}

/// Orders Slack `ts` tokens (`<seconds>.<fraction>`) numerically.
///
/// Integer parts compare by significant-digit length and then digit by digit;
/// fractional parts are right-padded before comparison. The empty token sorts
/// before every other token.
pub fn compare_slack_timestamps(left: &str, right: &str) -> Ordering {
    let (left_int, left_frac) = split_timestamp(left);
    let (right_int, right_frac) = split_timestamp(right);

    let left_int = left_int.trim_start_matches('0');
    let right_int = right_int.trim_start_matches('0');
    let integer_order = left_int
        .len()
        .cmp(&right_int.len())
        .then_with(|| left_int.cmp(right_int));
    if integer_order != Ordering::Equal {
        return integer_order;
    }

    let width = left_frac.len().max(right_frac.len());
    let left_frac = format!("{left_frac:0<width$}");
    let right_frac = format!("{right_frac:0<width$}");
    left_frac.cmp(&right_frac)
}

fn split_timestamp(value: &str) -> (&str, &str) {
    let value = value.trim();
    value.split_once('.').unwrap_or((value, ""))
}
