//! Classification of chat messages into coding tasks.
//!
//! The oracle is an external model behind [`ClassificationOracle`]; this crate
//! renders its request, strips formatting noise from its reply and validates the
//! reply into a [`Verdict`].

mod claude_cli_oracle;
mod classifier;
mod repo_discovery;
mod verdict;

pub use claude_cli_oracle::{ClaudeCliOracle, ClaudeCliOracleConfig};
pub use classifier::{render_classification_prompt, ClassificationOracle, Classifier};
pub use repo_discovery::discover_repositories;
pub use verdict::{parse_verdict, ActionableTask, ClassificationError, Verdict};
