//! crumbjar - shared cookie jar maintenance
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use crumbjar::cli::{commands, Cli, Commands};
use crumbjar::config::{self, Config, ConfigManager};
use crumbjar::error::JarResult;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> JarResult<()> {
    let Cli {
        command,
        verbose,
        config: config_path,
        jar,
    } = Cli::parse();
    let jar = jar.as_deref();
    let load = || load_config(config_path.clone(), verbose);

    match command {
        // Keygen prints the key and nothing else; it needs no config
        Commands::Keygen(args) => {
            init_logging(verbose, "text");
            commands::keygen(args)
        }
        Commands::List(args) => commands::list(args, config::jar_options(&load()?.1, jar)?),
        Commands::Purge => commands::purge(config::jar_options(&load()?.1, jar)?),
        Commands::Remove(args) => commands::remove(args, config::jar_options(&load()?.1, jar)?),
        Commands::Clear(args) => commands::clear(args, config::jar_options(&load()?.1, jar)?),
        Commands::Merge(args) => commands::merge(args, config::jar_options(&load()?.1, jar)?),
        Commands::Fingerprint => commands::fingerprint(&load()?.1),
        Commands::Config(args) => {
            let (manager, config) = load()?;
            commands::config(args, &config, &manager)
        }
    }
}

/// Load the configuration and install logging in its format
fn load_config(path: Option<PathBuf>, verbose: u8) -> JarResult<(ConfigManager, Config)> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };
    let config = manager.load()?;
    init_logging(verbose, &config.general.log_format);
    Ok((manager, config))
}

/// 0 = warn, 1 = info, 2+ = debug. Logs go to stderr.
fn init_logging(verbose: u8, format: &str) {
    let filter = match verbose {
        0 => EnvFilter::new("crumbjar=warn"),
        1 => EnvFilter::new("crumbjar=info"),
        _ => EnvFilter::new("crumbjar=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
