use async_trait::async_trait;

use crate::verdict::{parse_verdict, ClassificationError, Verdict};

#[async_trait]
/// External model that answers a rendered classification request.
pub trait ClassificationOracle: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Renders the oracle request for one chat message.
pub fn render_classification_prompt(message: &str, known_repos: &[String]) -> String {
    let repo_list = known_repos
        .iter()
        .map(|repo| format!("- {repo}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You classify Slack messages to determine if they're actionable coding/development work items.

Available repositories:
{repo_list}

Slack message:
"{message}"

Analyze this message and determine:
1. Is this an actionable work item? (bug fix, feature request, code task, etc.)
2. If yes, which repository from the list above does it relate to?
3. Generate a brief summary and a git branch name.

IMPORTANT: Only respond with valid JSON, no other text.

If actionable, respond with:
{{"actionable": true, "repo": "repo-name-from-list", "summary": "Brief description of the task", "branch": "kebab-case-branch-name"}}

If NOT actionable (casual chat, questions without action items, greetings, etc):
{{"actionable": false}}"#
    )
}

/// Single-shot classification adapter. No retries happen here.
pub struct Classifier<O> {
    oracle: O,
}

impl<O: ClassificationOracle> Classifier<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub async fn classify(
        &self,
        text: &str,
        known_repos: &[String],
    ) -> Result<Verdict, ClassificationError> {
        let prompt = render_classification_prompt(text, known_repos);
        let raw = self
            .oracle
            .complete(&prompt)
            .await
            .map_err(|error| ClassificationError::Oracle(format!("{error:#}")))?;
        let verdict = parse_verdict(&raw)?;
        tracing::debug!(
            known_repos = known_repos.len(),
            actionable = verdict.is_actionable(),
            "message classified"
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use async_trait::async_trait;

    use super::{render_classification_prompt, ClassificationOracle, Classifier};
    use crate::verdict::{ActionableTask, ClassificationError, Verdict};

    struct CannedOracle {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedOracle {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ClassificationOracle for CannedOracle {
        async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
            self.prompts
                .lock()
                .expect("prompts lock")
                .push(prompt.to_string());
            self.reply.clone().map_err(|message| anyhow!(message))
        }
    }

    fn repos() -> Vec<String> {
        vec!["api".to_string(), "web".to_string()]
    }

    #[test]
    fn unit_render_classification_prompt_lists_repos_and_quotes_message() {
        let prompt = render_classification_prompt("login is broken", &repos());
        assert!(prompt.contains("Available repositories:\n- api\n- web\n"));
        assert!(prompt.contains("Slack message:\n\"login is broken\""));
        assert!(prompt.contains(r#"{"actionable": false}"#));
        assert!(prompt.contains(r#""branch": "kebab-case-branch-name""#));
    }

    #[tokio::test]
    async fn functional_classify_returns_validated_verdict() {
        let classifier = Classifier::new(CannedOracle::replying(
            "```json\n{\"actionable\":true,\"repo\":\"web\",\"summary\":\"fix login\",\"branch\":\"fix-login\"}\n```",
        ));
        let verdict = classifier
            .classify("login is broken", &repos())
            .await
            .expect("verdict");
        assert_eq!(
            verdict,
            Verdict::Actionable(ActionableTask {
                repo: "web".to_string(),
                summary: "fix login".to_string(),
                branch: "fix-login".to_string(),
            })
        );
        let prompts = classifier.oracle.prompts.lock().expect("prompts lock");
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("login is broken"));
    }

    #[tokio::test]
    async fn regression_classify_maps_oracle_failure_and_malformed_output() {
        let failing = Classifier::new(CannedOracle::failing("rate limited"));
        let error = failing.classify("hi", &repos()).await.expect_err("oracle");
        assert!(matches!(error, ClassificationError::Oracle(ref message) if message.contains("rate limited")));

        let garbled = Classifier::new(CannedOracle::replying("I think so?"));
        let error = garbled.classify("hi", &repos()).await.expect_err("malformed");
        assert!(matches!(error, ClassificationError::Malformed { .. }));
    }
}
