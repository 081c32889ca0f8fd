//! Command entry points behind the `autowork` subcommands.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use autowork_classifier::{ClaudeCliOracle, ClaudeCliOracleConfig, Classifier};
use autowork_cli::{AutoworkCommand, Cli};
use autowork_config::{
    load_config, resolve_config_dir, run_config_wizard, save_config, AutoworkConfig,
    AutoworkPaths, WizardDefaults,
};
use autowork_core::format_local_clock;
use autowork_runtime::{
    resume_session, run_poll_loop, AgentProfile, ClaudeCodeAgent, GitCli, HappyNotifier,
    NoopNotifier, Notifier, PipelineState, PollEvent, SessionSpawner, WorkPipeline,
};
use autowork_session::SessionRegistry;
use autowork_slack_runtime::{SlackApiClient, SlackApiClientConfig, WatermarkStore};

use crate::command_output::{
    render_cycle_banner, render_cycle_error, render_cycle_report, render_resume_banner,
    render_session_list, render_start_banner,
};

pub(crate) async fn run_cli(cli: Cli) -> Result<()> {
    let paths = AutoworkPaths::new(resolve_config_dir(cli.config_dir.as_deref())?);
    let profile = AgentProfile::from_happy_flag(cli.happy);
    tracing::debug!(
        config_dir = %paths.root().display(),
        agent = profile.executable(),
        "dispatching command"
    );

    match cli.command {
        AutoworkCommand::Config => execute_config_command(&paths),
        AutoworkCommand::Check => execute_check_command(&paths, profile).await,
        AutoworkCommand::Start => execute_start_command(&paths, profile).await,
        AutoworkCommand::Sessions => execute_sessions_command(&paths),
        AutoworkCommand::Open { id } => execute_open_command(&paths, profile, &id).await,
    }
}

fn execute_config_command(paths: &AutoworkPaths) -> Result<()> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    let config = run_config_wizard(&mut input, &mut output, &WizardDefaults::from_home())?;

    let config_path = paths.config_path();
    save_config(&config_path, &config).context("Error saving config")?;
    writeln!(output, "\nConfiguration saved to {}", config_path.display())
        .context("failed to write config summary")?;
    Ok(())
}

async fn execute_check_command(paths: &AutoworkPaths, profile: AgentProfile) -> Result<()> {
    let config = load_config(&paths.config_path())?;
    let (pipeline, mut state) = build_pipeline(&config, paths, profile)?;

    println!("{}", render_cycle_banner(&format_local_clock()));
    match pipeline.run_cycle(&mut state).await {
        Ok(report) => println!("{}", render_cycle_report(&report)),
        Err(error) => println!("{}", render_cycle_error(&error)),
    }
    Ok(())
}

async fn execute_start_command(paths: &AutoworkPaths, profile: AgentProfile) -> Result<()> {
    let config = load_config(&paths.config_path())?;
    let (pipeline, mut state) = build_pipeline(&config, paths, profile)?;

    println!("{}", render_start_banner(config.poll_interval_seconds));
    run_poll_loop(
        &pipeline,
        &mut state,
        Duration::from_secs(config.poll_interval_seconds),
        None,
        |event| match event {
            PollEvent::CycleStarted { .. } => {
                println!("{}", render_cycle_banner(&format_local_clock()));
            }
            PollEvent::CycleFinished { outcome, .. } => match outcome {
                Ok(report) => println!("{}", render_cycle_report(report)),
                Err(error) => println!("{}", render_cycle_error(error)),
            },
        },
    )
    .await;
    Ok(())
}

fn execute_sessions_command(paths: &AutoworkPaths) -> Result<()> {
    let registry = SessionRegistry::load(paths.sessions_path())?;
    println!("{}", render_session_list(registry.list()));
    Ok(())
}

async fn execute_open_command(
    paths: &AutoworkPaths,
    profile: AgentProfile,
    session_id: &str,
) -> Result<()> {
    let registry = SessionRegistry::load(paths.sessions_path())?;
    let Some(session) = registry.find(session_id) else {
        bail!("session not found: {session_id}");
    };

    println!("{}", render_resume_banner(session));
    resume_session(session, &GitCli::default(), &ClaudeCodeAgent::new(profile)).await?;
    Ok(())
}

fn build_pipeline(
    config: &AutoworkConfig,
    paths: &AutoworkPaths,
    profile: AgentProfile,
) -> Result<(WorkPipeline<ClaudeCliOracle>, PipelineState)> {
    let transport = SlackApiClient::new(SlackApiClientConfig {
        api_base: config.slack_api_base.clone(),
        token: config.slack_token.clone(),
        cookie: config.slack_cookie.clone(),
        history_limit: config.history_limit,
        request_timeout_ms: config.request_timeout_ms,
        retry_max_attempts: config.retry_max_attempts,
        retry_base_delay_ms: config.retry_base_delay_ms,
    })?;
    let oracle = ClaudeCliOracle::new(ClaudeCliOracleConfig {
        executable: config.classifier_executable.clone(),
        model: config.classifier_model.clone(),
        timeout_ms: config.classifier_timeout_ms,
    })?;
    let notifier: Arc<dyn Notifier> = match profile {
        AgentProfile::HappyCoder => Arc::new(HappyNotifier::default()),
        AgentProfile::ClaudeCode => Arc::new(NoopNotifier),
    };
    let spawner = SessionSpawner::new(
        config.repos_dir.clone(),
        paths.active_sessions_dir(),
        Arc::new(GitCli::default()),
        Arc::new(ClaudeCodeAgent::new(profile)),
        notifier,
    );
    let pipeline = WorkPipeline::new(
        Arc::new(transport),
        config.watched_channels(),
        Classifier::new(oracle),
        spawner,
    );

    let state = PipelineState::new(
        WatermarkStore::load(paths.state_path())?,
        SessionRegistry::load(paths.sessions_path())?,
    );
    Ok((pipeline, state))
}
