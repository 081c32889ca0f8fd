use autowork_core::truncate_chars;
use serde::Deserialize;
use thiserror::Error;

const MALFORMED_CONTENT_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
/// The target of an actionable message.
pub struct ActionableTask {
    pub repo: String,
    pub summary: String,
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Oracle decision for one message.
pub enum Verdict {
    NotActionable,
    Actionable(ActionableTask),
}

impl Verdict {
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Actionable(_))
    }
}

#[derive(Debug, Error)]
/// Classification of one message failed; the message is skipped.
pub enum ClassificationError {
    #[error("failed to list repos: {0}")]
    RepoDiscovery(String),
    #[error("classifier oracle failed: {0}")]
    Oracle(String),
    #[error("failed to parse classification: {reason} (content: {content})")]
    Malformed { reason: String, content: String },
}

impl ClassificationError {
    fn malformed(reason: impl Into<String>, content: &str) -> Self {
        Self::Malformed {
            reason: reason.into(),
            content: truncate_chars(content, MALFORMED_CONTENT_PREVIEW_CHARS),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    actionable: bool,
    #[serde(default)]
    repo: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    branch: Option<String>,
}

/// Parses oracle output into a [`Verdict`].
///
/// Markdown fences around the object are tolerated, as is prose before the
/// first `{` or after the last `}`.
pub fn parse_verdict(raw: &str) -> Result<Verdict, ClassificationError> {
    let content = strip_code_fences(raw);
    let parsed = match serde_json::from_str::<RawVerdict>(content) {
        Ok(parsed) => parsed,
        Err(error) => match outermost_object(content) {
            Some(object) if object != content => serde_json::from_str::<RawVerdict>(object)
                .map_err(|error| ClassificationError::malformed(error.to_string(), content))?,
            _ => return Err(ClassificationError::malformed(error.to_string(), content)),
        },
    };

    if !parsed.actionable {
        return Ok(Verdict::NotActionable);
    }

    let repo = required_field(parsed.repo, "repo", content)?;
    let summary = required_field(parsed.summary, "summary", content)?;
    let branch = required_field(parsed.branch, "branch", content)?;
    if !is_single_path_component(&repo) {
        return Err(ClassificationError::malformed(
            format!("repo '{repo}' is not a plain repository name"),
            content,
        ));
    }
    if branch.starts_with('-') || branch.chars().any(char::is_whitespace) {
        return Err(ClassificationError::malformed(
            format!("branch '{branch}' is not a usable branch name"),
            content,
        ));
    }

    Ok(Verdict::Actionable(ActionableTask {
        repo,
        summary,
        branch,
    }))
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed);
    trimmed.trim()
}

fn outermost_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (start < end).then(|| &content[start..=end])
}

fn required_field(
    value: Option<String>,
    name: &str,
    content: &str,
) -> Result<String, ClassificationError> {
    match value.map(|value| value.trim().to_string()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ClassificationError::malformed(
            format!("actionable verdict is missing '{name}'"),
            content,
        )),
    }
}

fn is_single_path_component(name: &str) -> bool {
    !name.starts_with('.') && !name.contains('/') && !name.contains('\\')
}
