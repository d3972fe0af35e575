//! Interlink - keyword-driven internal links for markdown content.

mod check;
mod cli;
mod config;
mod corpus;
mod dry_run;
mod logger;
mod refresh;
mod report;
mod session;
mod strip;

use anyhow::{Result, bail};
use check::check_corpus;
use clap::Parser;
use cli::{Cli, Commands};
use config::InterlinkConfig;
use dry_run::plan_corpus;
use refresh::refresh_corpus;
use session::Session;
use std::{path::Path, process::ExitCode};
use strip::strip_corpus;

fn main() -> Result<ExitCode> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config: &'static InterlinkConfig = Box::leak(Box::new(load_config(cli)?));

    let session = Session::open(config, cli.injects())?;
    let ok = match &cli.command {
        Commands::Refresh { .. } => refresh_corpus(&session, cli.format)?,
        Commands::Check { .. } => check_corpus(&session, cli.format)?,
        Commands::DryRun { .. } => plan_corpus(&session, cli.format)?,
        Commands::Strip => strip_corpus(&session, cli.format)?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &'static Cli) -> Result<InterlinkConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    // Injecting needs a keyword map, which only comes from the config file
    let mut config = match (config_path.exists(), cli.injects()) {
        (true, _) => InterlinkConfig::from_path(&config_path)?,
        (false, true) => bail!("Config file not found: {}", config_path.display()),
        (false, false) => InterlinkConfig::default(),
    };
    config.update_with_cli(cli);
    config.validate()?;

    Ok(config)
}
