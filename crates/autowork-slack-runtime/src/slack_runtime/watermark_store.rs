use std::{
    collections::BTreeMap,
    path::PathBuf,
};

use anyhow::{bail, Result};
use autowork_core::{load_json_document, save_json_document};
use serde::{Deserialize, Serialize};

use super::compare_slack_timestamps;

pub const WATERMARK_STATE_SCHEMA_VERSION: u32 = 1;

fn legacy_schema_version() -> u32 {
    WATERMARK_STATE_SCHEMA_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WatermarkState {
    #[serde(default = "legacy_schema_version")]
    schema_version: u32,
    #[serde(default)]
    last_timestamps: BTreeMap<String, String>,
}

impl Default for WatermarkState {
    fn default() -> Self {
        Self {
            schema_version: WATERMARK_STATE_SCHEMA_VERSION,
            last_timestamps: BTreeMap::new(),
        }
    }
}

/// Per-channel "last seen" cursors backed by `state.json`.
///
/// Cursors only move forward; `advance` ignores timestamps that are not newer
/// than the stored one.
pub struct WatermarkStore {
    path: PathBuf,
    state: WatermarkState,
}

impl WatermarkStore {
    pub fn load(path: PathBuf) -> Result<Self> {
        let state = load_json_document::<WatermarkState>(&path)?.unwrap_or_default();
        if state.schema_version > WATERMARK_STATE_SCHEMA_VERSION {
            bail!(
                "unsupported watermark state schema in {}: expected {}, found {}",
                path.display(),
                WATERMARK_STATE_SCHEMA_VERSION,
                state.schema_version
            );
        }
        Ok(Self { path, state })
    }

    /// Returns the channel cursor, or `""` when the channel was never fetched.
    pub fn watermark(&self, channel_id: &str) -> &str {
        self.state
            .last_timestamps
            .get(channel_id)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn advance(&mut self, channel_id: &str, timestamp: &str) -> bool {
        if timestamp.trim().is_empty() {
            return false;
        }
        let current = self.watermark(channel_id);
        if compare_slack_timestamps(timestamp, current).is_le() {
            return false;
        }
        self.state
            .last_timestamps
            .insert(channel_id.to_string(), timestamp.to_string());
        true
    }

    pub fn save(&self) -> Result<()> {
        let mut state = self.state.clone();
        state.schema_version = WATERMARK_STATE_SCHEMA_VERSION;
        save_json_document(&self.path, &state)
    }
}
