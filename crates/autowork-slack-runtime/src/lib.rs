//! Slack ingestion runtime for Autowork.
//!
//! Hosts the chat collaborator contract, the Slack Web API client that fulfils
//! it, the per-channel watermark store, and the ingestion step that turns a set
//! of watched channels into one ordered batch of work items.

pub mod slack_runtime;

pub use slack_runtime::{
    compare_slack_timestamps, fetch_new, ChatMessage, ChatTransport, SlackApiClient,
    SlackApiClientConfig, TransportError, WatermarkStore, WATERMARK_STATE_SCHEMA_VERSION,
};
