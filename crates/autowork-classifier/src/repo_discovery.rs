use std::path::Path;

use anyhow::{Context, Result};

/// Lists the git working trees directly under `repos_dir`, sorted by name.
///
/// Hidden directories are skipped. A `.git` entry may be a directory or a
/// worktree pointer file.
pub fn discover_repositories(repos_dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(repos_dir)
        .with_context(|| format!("failed to list repositories in {}", repos_dir.display()))?;

    let mut repos = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read entry in {}", repos_dir.display()))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_dir() && path.join(".git").exists() {
            repos.push(name);
        }
    }
    repos.sort();
    Ok(repos)
}
