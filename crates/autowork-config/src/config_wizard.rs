//! Interactive prompts behind `autowork config`.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::watcher_config::{AutoworkConfig, DEFAULT_POLL_INTERVAL_SECONDS};

const CREDENTIAL_INSTRUCTIONS: &str = "\
Autowork Configuration
======================

To get your Slack credentials:
1. Open Slack in your browser
2. Open DevTools (F12) -> Application -> Cookies
3. Copy the 'd' cookie value
4. In Network tab, find any API call and copy the 'token' parameter (starts with xoxc-)
";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Values offered when the operator presses enter on a prompt.
pub struct WizardDefaults {
    pub repos_dir: PathBuf,
    pub poll_interval_seconds: u64,
}

impl WizardDefaults {
    /// `$HOME/gh` and a five minute poll interval.
    pub fn from_home() -> Self {
        let repos_dir = dirs::home_dir()
            .map(|home| home.join("gh"))
            .unwrap_or_else(|| PathBuf::from("gh"));
        Self {
            repos_dir,
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
        }
    }
}

/// Prompts for every required field and returns the assembled config.
pub fn run_config_wizard<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    defaults: &WizardDefaults,
) -> Result<AutoworkConfig> {
    writeln!(output, "{CREDENTIAL_INSTRUCTIONS}").context("failed to write config prompt")?;

    let slack_token = prompt_line(input, output, "Slack token (xoxc-...): ")?;
    let slack_cookie = prompt_line(input, output, "Slack 'd' cookie (xoxd-...): ")?;

    let repos_prompt = format!("Repos directory [{}]: ", defaults.repos_dir.display());
    let repos_dir = match prompt_line(input, output, &repos_prompt)? {
        value if value.is_empty() => defaults.repos_dir.clone(),
        value => PathBuf::from(value),
    };

    let channels = prompt_line(input, output, "Channel IDs to watch (comma-separated): ")?;
    let channel_ids = parse_channel_list(&channels);

    let interval_prompt = format!(
        "Poll interval in seconds [{}]: ",
        defaults.poll_interval_seconds
    );
    let poll_interval_seconds = parse_poll_interval(
        &prompt_line(input, output, &interval_prompt)?,
        defaults.poll_interval_seconds,
    );

    let mut config = AutoworkConfig::new(slack_token, slack_cookie, repos_dir, channel_ids);
    config.poll_interval_seconds = poll_interval_seconds;
    Ok(config)
}

fn prompt_line<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> Result<String> {
    write!(output, "{prompt}").context("failed to write config prompt")?;
    output.flush().context("failed to flush config prompt")?;
    let mut buffer = String::new();
    input
        .read_line(&mut buffer)
        .context("failed to read config prompt response")?;
    Ok(buffer.trim().to_string())
}

fn parse_channel_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|channel| !channel.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_poll_interval(raw: &str, default_seconds: u64) -> u64 {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => value,
        _ => default_seconds,
    }
}
