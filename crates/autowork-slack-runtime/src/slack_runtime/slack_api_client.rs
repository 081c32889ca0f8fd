//! Slack Web API client used by the ingestion poll.
//!
//! Authenticates with a browser-session `xoxc-` token sent as a form field plus
//! the matching `d` cookie, which is what those tokens require.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use autowork_core::truncate_chars;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::slack_helpers::{
    is_human_message, is_retryable_slack_status, is_retryable_transport_error,
    parse_retry_after, retry_delay,
};
use super::{compare_slack_timestamps, ChatMessage, ChatTransport};

const RETRY_ATTEMPT_HEADER: &str = "x-autowork-retry-attempt";
pub const MAX_HISTORY_PAGES: usize = 20;

#[derive(Debug, Clone, Deserialize)]
struct SlackHistoryResponse {
    ok: bool,
    #[serde(default)]
    messages: Vec<SlackHistoryMessage>,
    error: Option<String>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    response_metadata: Option<SlackResponseMetadata>,
}

impl SlackHistoryResponse {
    fn next_cursor(&self) -> Option<&str> {
        if !self.has_more {
            return None;
        }
        self.response_metadata
            .as_ref()
            .map(|metadata| metadata.next_cursor.trim())
            .filter(|cursor| !cursor.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SlackResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackHistoryMessage {
    #[serde(default)]
    user: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    ts: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Connection settings for [`SlackApiClient`].
pub struct SlackApiClientConfig {
    pub api_base: String,
    pub token: String,
    pub cookie: String,
    pub history_limit: u32,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

#[derive(Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    cookie: String,
    history_limit: u32,
    retry_max_attempts: usize,
    retry_base_delay_ms: u64,
}

impl SlackApiClient {
    pub fn new(config: SlackApiClientConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("autowork-slack-poller"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .context("failed to create slack api client")?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.trim().to_string(),
            cookie: config.cookie.trim().to_string(),
            history_limit: config.history_limit.max(1),
            retry_max_attempts: config.retry_max_attempts.max(1),
            retry_base_delay_ms: config.retry_base_delay_ms.max(1),
        })
    }

    /// Fetches human messages newer than `oldest`, returned oldest first.
    ///
    /// Follows `next_cursor` pages until Slack reports no more history, up to
    /// [`MAX_HISTORY_PAGES`] requests.
    pub async fn conversation_history(
        &self,
        channel: &str,
        oldest: &str,
    ) -> Result<Vec<ChatMessage>> {
        let mut entries = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0_usize;
        loop {
            let response = self
                .conversation_history_page(channel, oldest, cursor.as_deref())
                .await?;
            pages = pages.saturating_add(1);
            let next = response.next_cursor().map(str::to_string);
            entries.extend(response.messages);
            match next {
                Some(next) if pages < MAX_HISTORY_PAGES => cursor = Some(next),
                Some(_) => {
                    tracing::warn!(
                        channel = %channel,
                        pages,
                        "slack history still has more pages, stopping at page limit"
                    );
                    break;
                }
                None => break,
            }
        }

        let total = entries.len();
        let mut messages = entries
            .into_iter()
            .filter(|message| {
                is_human_message(
                    &message.kind,
                    message.subtype.as_deref(),
                    message.bot_id.as_deref(),
                )
            })
            .filter(|message| !message.user.is_empty() && !message.ts.is_empty())
            .filter(|message| compare_slack_timestamps(&message.ts, oldest).is_gt())
            .map(|message| ChatMessage {
                channel: channel.to_string(),
                author: message.user,
                text: message.text,
                timestamp: message.ts,
            })
            .collect::<Vec<_>>();
        messages.sort_by(|left, right| compare_slack_timestamps(&left.timestamp, &right.timestamp));

        tracing::debug!(
            channel = %channel,
            oldest = %oldest,
            pages,
            returned = total,
            kept = messages.len(),
            "slack conversations.history completed"
        );
        Ok(messages)
    }

    async fn conversation_history_page(
        &self,
        channel: &str,
        oldest: &str,
        cursor: Option<&str>,
    ) -> Result<SlackHistoryResponse> {
        let limit = self.history_limit.to_string();
        let mut form = vec![
            ("token", self.token.as_str()),
            ("channel", channel),
            ("limit", limit.as_str()),
        ];
        if !oldest.is_empty() {
            form.push(("oldest", oldest));
        }
        if let Some(cursor) = cursor {
            form.push(("cursor", cursor));
        }
        let cookie = format!("d={}", self.cookie);

        let response: SlackHistoryResponse = self
            .request_json("conversations.history", || {
                self.http
                    .post(format!("{}/conversations.history", self.api_base))
                    .header(reqwest::header::COOKIE, cookie.as_str())
                    .form(&form)
            })
            .await?;

        if !response.ok {
            bail!(
                "slack api error: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }
        Ok(response)
    }

    async fn request_json<T, F>(&self, operation: &str, mut builder: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = builder()
                .header(RETRY_ATTEMPT_HEADER, attempt.saturating_sub(1).to_string())
                .send()
                .await;
            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed = response
                            .json::<T>()
                            .await
                            .with_context(|| format!("failed to decode slack {operation}"))?;
                        return Ok(parsed);
                    }

                    let retry_after = parse_retry_after(response.headers());
                    let body = response.text().await.unwrap_or_default();
                    if attempt < self.retry_max_attempts
                        && is_retryable_slack_status(status.as_u16())
                    {
                        tracing::debug!(
                            operation,
                            attempt,
                            status = status.as_u16(),
                            "retrying slack request"
                        );
                        tokio::time::sleep(retry_delay(
                            self.retry_base_delay_ms,
                            attempt,
                            retry_after,
                        ))
                        .await;
                        continue;
                    }

                    bail!(
                        "slack api {operation} failed with status {}: {}",
                        status.as_u16(),
                        truncate_chars(&body, 800)
                    );
                }
                Err(error) => {
                    if attempt < self.retry_max_attempts && is_retryable_transport_error(&error) {
                        tokio::time::sleep(retry_delay(self.retry_base_delay_ms, attempt, None))
                            .await;
                        continue;
                    }
                    return Err(error)
                        .with_context(|| format!("slack api {operation} request failed"));
                }
            }
        }
    }
}

#[async_trait]
impl ChatTransport for SlackApiClient {
    async fn fetch(&self, channel_id: &str, watermark: &str) -> Result<Vec<ChatMessage>> {
        self.conversation_history(channel_id, watermark).await
    }
}
