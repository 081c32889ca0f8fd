use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{bail, Context, Result};

use crate::time_utils::current_unix_timestamp_ms;

static TEMP_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Writes text using a temp file + rename so readers never observe partial data.
pub fn write_text_atomic(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content, false)
}

/// Like [`write_text_atomic`], but the temp file is created owner-only (0600 on
/// unix) so the content is never readable by others at any point.
pub fn write_private_text_atomic(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content, true)
}

fn write_atomic(path: &Path, content: &str, private: bool) -> Result<()> {
    if path.as_os_str().is_empty() {
        bail!("destination path cannot be empty");
    }
    if path.is_dir() {
        bail!("destination path '{}' is a directory", path.display());
    }

    let parent_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent_dir)
        .with_context(|| format!("failed to create {}", parent_dir.display()))?;

    let temp_name = format!(
        ".{}.tmp-{}-{}-{}",
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("document"),
        std::process::id(),
        current_unix_timestamp_ms(),
        TEMP_FILE_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let temp_path = parent_dir.join(temp_name);
    write_temp_file(&temp_path, content, private)
        .with_context(|| format!("failed to write temporary file {}", temp_path.display()))?;
    if let Err(error) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(error).with_context(|| {
            format!(
                "failed to rename temporary file {} to {}",
                temp_path.display(),
                path.display()
            )
        });
    }
    Ok(())
}

fn write_temp_file(path: &Path, content: &str, private: bool) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if private {
            options.mode(0o600);
        }
    }
    #[cfg(not(unix))]
    let _ = private;
    let mut file = options.open(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}
