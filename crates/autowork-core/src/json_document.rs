//! Whole-document JSON persistence.
//!
//! Every persisted concern (config, watermarks, sessions) is read and written as
//! a single document; there are no partial updates.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

use crate::atomic_io::{write_private_text_atomic, write_text_atomic};

/// Loads a JSON document, returning `None` when the file does not exist.
///
/// A file that exists but is empty or whitespace-only also maps to `None`.
pub fn load_json_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let parsed = serde_json::from_str::<T>(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(parsed))
}

/// Serializes `value` as pretty JSON with a trailing newline and writes it atomically.
pub fn save_json_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let payload = render_json_document(path, value)?;
    write_text_atomic(path, &payload)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Same as [`save_json_document`] for documents holding credentials.
pub fn save_private_json_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let payload = render_json_document(path, value)?;
    write_private_text_atomic(path, &payload)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn render_json_document<T: Serialize>(path: &Path, value: &T) -> Result<String> {
    let mut payload = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    payload.push('\n');
    Ok(payload)
}
