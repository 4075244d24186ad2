mod cli;
mod config;
mod paths;
mod run;

use anyhow::Result;
use cli::{Command, ConfigAction};

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Snapshot(args)) => run::snapshot(args),
        Some(Command::Config(config_cmd)) => match config_cmd.action {
            ConfigAction::Check(args) => run::check_config(args),
        },
        None => run::run(cli.run),
    }
}
