use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::process::{Child, Command};

const MAX_TEXT_FILE_BUSY_RETRIES: u32 = 5;
const TEXT_FILE_BUSY_ERRNO: i32 = 26;

/// Spawns `command`, retrying briefly while the executable is still open for
/// writing (`ETXTBSY`), which happens right after a script has been written.
pub async fn spawn_with_text_file_busy_retry(
    command: &mut Command,
    executable: &str,
) -> Result<Child> {
    let mut attempt = 0;
    loop {
        match command.spawn() {
            Ok(child) => return Ok(child),
            Err(error)
                if error.raw_os_error() == Some(TEXT_FILE_BUSY_ERRNO)
                    && attempt < MAX_TEXT_FILE_BUSY_RETRIES =>
            {
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
            Err(error) => return Err(anyhow!("failed to spawn '{executable}': {error}")),
        }
    }
}
