//! Command-line interface.
//!
//! Exit codes: 0 when the command succeeds and any validator accepts,
//! 1 on configuration or I/O errors, 2 when a validator rejects its input.

pub mod cache;
pub mod check;
pub mod command;
pub mod config;
pub mod output;

use std::path::Path;

use self::command::{CacheCommand, Cli, ColorChoice, Commands, ConfigCommand};
use self::output::OutputConfig;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Outcome of a command that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected,
}

impl Verdict {
    #[must_use]
    pub const fn from_valid(valid: bool) -> Self {
        if valid {
            Self::Accepted
        } else {
            Self::Rejected
        }
    }

    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Accepted => 0,
            Self::Rejected => 2,
        }
    }
}

/// Run a parsed command line and return the process exit code.
pub async fn run(cli: Cli) -> i32 {
    let color = output::resolve_color(
        matches!(cli.color, ColorChoice::Always),
        matches!(cli.color, ColorChoice::Never),
    );
    output::configure(OutputConfig::new(cli.json, cli.quiet, color));

    match dispatch(&cli).await {
        Ok(verdict) => verdict.exit_code(),
        Err(e) => {
            output::error(&e.to_string());
            1
        }
    }
}

async fn dispatch(cli: &Cli) -> Result<Verdict> {
    match &cli.command {
        Commands::Check(command) => {
            let config = load(&cli.config)?;
            check::execute(command, &config)
        }
        Commands::Config(ConfigCommand::Validate) => {
            config::execute_validate(&cli.config)?;
            Ok(Verdict::Accepted)
        }
        Commands::Config(ConfigCommand::Show) => {
            config::execute_show(&cli.config)?;
            Ok(Verdict::Accepted)
        }
        Commands::Cache(CacheCommand::Stats) => {
            let config = load(&cli.config)?;
            cache::execute_stats(&config).await?;
            Ok(Verdict::Accepted)
        }
    }
}

/// Load the config (or defaults) and start logging.
fn load(path: &Path) -> Result<Config> {
    let config = Config::load_or_default(path)?;
    config.init_logging();
    Ok(config)
}
