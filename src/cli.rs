//! CLI definition and parsing.
//! A thin dispatch surface over the engine: subcommands map one-to-one onto
//! engine operations and registry accessors.

use clap::{Parser, Subcommand, ValueHint};
use std::path::{Path, PathBuf};

/// Move files or folders into a sync directory and leave tracked redirects
/// behind at their original locations.
#[derive(Parser, Debug)]
#[command(author, version, about = "Track files in a sync directory via symlinks or shortcuts")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, global = true, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Enable debug logging (shorthand for --log-level debug).
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Emit logs in structured JSON.
    #[arg(long, global = true, help = "Emit logs in structured JSON")]
    pub json: bool,

    /// Also write logs to this file.
    #[arg(long, global = true, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Use a registry file other than the default beside the executable.
    #[arg(long, global = true, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub registry: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Move TARGET into the sync directory and leave a symlink behind, or
    /// create a launcher shortcut with --shortcut.
    Link {
        #[arg(value_name = "TARGET", value_hint = ValueHint::AnyPath)]
        target: PathBuf,

        /// Name for the link (defaults to the target's base name).
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Sync directory (defaults to the configured default-sync-dir).
        #[arg(short = 's', long = "sync-dir", value_name = "DIR", value_hint = ValueHint::DirPath)]
        sync_dir: Option<PathBuf>,

        /// Create a launcher shortcut instead of relocating the target.
        #[arg(long)]
        shortcut: bool,
    },

    /// Remove a managed link by name; '*' removes all of them.
    Unlink {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Check a managed link and repair it if broken; '*' checks all of them.
    Relink {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// List managed links.
    List,

    /// Get or set configuration values.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print a configuration value.
    Get {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Set a configuration value.
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
}

/// Default link name: the target's base name, with a trailing `.exe`
/// stripped so Windows executables get friendly names.
pub fn default_link_name(target: &Path) -> Option<String> {
    let base = target.file_name()?.to_string_lossy().into_owned();
    let name = if base.to_ascii_lowercase().ends_with(".exe") {
        base[..base.len() - 4].to_string()
    } else {
        base
    };
    if name.is_empty() { None } else { Some(name) }
}

pub fn parse() -> Args {
    Args::parse()
}
