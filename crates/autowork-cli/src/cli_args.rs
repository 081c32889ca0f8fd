use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "autowork",
    about = "Automatic Work Scheduler: turns Slack requests into coding-agent sessions",
    version
)]
pub struct Cli {
    #[arg(
        long = "config-dir",
        env = "AUTOWORK_CONFIG_DIR",
        global = true,
        help = "Directory holding config.json, state.json and sessions.json (default: ~/.autowork)"
    )]
    pub config_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "AUTOWORK_HAPPY",
        global = true,
        action = ArgAction::SetTrue,
        help = "Use Happy Coder (remote UI) instead of Claude Code and send push notifications"
    )]
    pub happy: bool,

    #[command(subcommand)]
    pub command: AutoworkCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum AutoworkCommand {
    /// Configure Slack credentials, repos directory and watched channels
    Config,
    /// Check for new messages once
    Check,
    /// Run as daemon (polls continuously)
    Start,
    /// List pending work sessions
    Sessions,
    /// Resume a work session
    Open {
        #[arg(help = "Session id as printed by `autowork sessions`")]
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::{CommandFactory, Parser};

    use super::{AutoworkCommand, Cli};

    #[test]
    fn unit_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn functional_cli_accepts_happy_flag_before_or_after_subcommand() {
        let before = Cli::try_parse_from(["autowork", "--happy", "check"]).expect("parse");
        assert!(before.happy);
        assert_eq!(before.command, AutoworkCommand::Check);

        let after = Cli::try_parse_from(["autowork", "open", "--happy", "a1b2c3d4"]).expect("parse");
        assert!(after.happy);
        assert_eq!(
            after.command,
            AutoworkCommand::Open {
                id: "a1b2c3d4".to_string()
            }
        );
    }

    #[test]
    fn functional_cli_parses_config_dir_override() {
        let cli = Cli::try_parse_from(["autowork", "sessions", "--config-dir", "/tmp/aw"])
            .expect("parse");
        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/aw")));
        assert_eq!(cli.command, AutoworkCommand::Sessions);
    }

    #[test]
    fn regression_cli_requires_session_id_for_open() {
        assert!(Cli::try_parse_from(["autowork", "open"]).is_err());
        assert!(Cli::try_parse_from(["autowork"]).is_err());
    }
}
