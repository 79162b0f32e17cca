//! `factlog` command-line entry point.

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use log::info;

fn main() -> anyhow::Result<()> {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();

    let cli = Cli::parse();
    info!(
        "starting factlog (command={}, db_set={}, config_set={})",
        cli.command.name(),
        cli.db.is_some(),
        cli.config.is_some()
    );
    commands::run(cli)
}
