//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// crumbjar - inspect and maintain a shared cookie jar file
///
/// Every command that changes the jar goes through the same locked
/// merge-and-rewrite as the library, so it is safe to run while other
/// processes use the file.
#[derive(Parser, Debug)]
#[command(name = "crumbjar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CRUMBJAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cookie file to operate on (overrides jar.path)
    #[arg(short, long, global = true, env = "CRUMBJAR_JAR")]
    pub jar: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List cookies in the jar
    List(ListArgs),

    /// Drop expired cookies from the file
    Purge,

    /// Delete a single cookie
    Remove(RemoveArgs),

    /// Delete every cookie
    Clear(ClearArgs),

    /// Merge another cookie file into the jar
    Merge(MergeArgs),

    /// Generate a random encryption key
    Keygen(KeygenArgs),

    /// Show the fingerprint of the configured key
    Fingerprint,

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,

    /// Include cookie values (decrypted when a key is configured)
    #[arg(long)]
    pub show_values: bool,
}

/// Arguments for the remove command
#[derive(Parser, Debug)]
pub struct RemoveArgs {
    /// Cookie domain as stored (e.g. .example.com)
    pub domain: String,

    /// Cookie path
    pub path: String,

    /// Cookie name
    pub name: String,
}

/// Arguments for the clear command
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the merge command
#[derive(Parser, Debug)]
pub struct MergeArgs {
    /// Cookie file to read; it is never modified
    pub file: PathBuf,
}

/// Arguments for the keygen command
#[derive(Parser, Debug)]
pub struct KeygenArgs {
    /// Key size in bits
    #[arg(short, long, default_value = "256", value_parser = parse_key_bits)]
    pub bits: u16,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for list command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

fn parse_key_bits(s: &str) -> Result<u16, String> {
    match s {
        "128" => Ok(128),
        "192" => Ok(192),
        "256" => Ok(256),
        _ => Err(format!("key size must be 128, 192 or 256 bits, got '{s}'")),
    }
}
