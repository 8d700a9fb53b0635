//! Application orchestrator.
//! Initializes logging, loads the registry, builds the engine with the
//! host's shortcut capability, and dispatches the parsed command.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

use crate::cli::{default_link_name, Args, Command, ConfigAction};
use crate::engine::{BulkReport, LinkEngine, RelinkOutcome, RemoveOutcome};
use crate::errors::SyncLinkError;
use crate::fs_ops;
use crate::logging::{init_tracing, LogLevel};
use crate::output as out;
use crate::platform;
use crate::registry::{LinkKind, Registry};

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    let level = if args.debug {
        LogLevel::Debug
    } else {
        args.log_level
            .as_deref()
            .and_then(LogLevel::parse)
            .unwrap_or_default()
    };
    // Hold the guard so file logs flush on exit.
    let _guard = init_tracing(&level, args.log_file.as_deref(), args.json)?;

    debug!(?args, "Starting synclink");

    let registry = match &args.registry {
        Some(path) => Registry::load_from(path.clone())?,
        None => Registry::load()?,
    };
    let engine = LinkEngine::new(Arc::new(registry), platform::default_provider());

    let result = dispatch(&engine, &args);
    if let Err(e) = &result {
        report_error(e);
    }
    result
}

fn dispatch(engine: &LinkEngine, args: &Args) -> Result<()> {
    match &args.command {
        Command::Link {
            target,
            name,
            sync_dir,
            shortcut,
        } => {
            let name = match name.clone().or_else(|| default_link_name(target)) {
                Some(n) => n,
                None => bail!(
                    "could not derive a link name from '{}'; use --name",
                    target.display()
                ),
            };
            let kind = if *shortcut {
                LinkKind::Shortcut
            } else {
                LinkKind::Symlink
            };
            let sync_dir = match kind {
                // Shortcuts never touch the sync directory.
                LinkKind::Shortcut => PathBuf::new(),
                LinkKind::Symlink => resolve_sync_dir(engine, sync_dir.as_deref())?,
            };
            let record = engine.create(target, &name, &sync_dir, kind)?;
            out::print_success(&format!(
                "Created {} '{}' -> {}",
                record.kind,
                name,
                record.synced_path.display()
            ));
            Ok(())
        }
        Command::Unlink { name } if name.as_str() == "*" => {
            print_tally("unlink", &engine.remove_all());
            Ok(())
        }
        Command::Unlink { name } => {
            match engine.remove(name)? {
                RemoveOutcome::Restored => out::print_success(&format!("Removed '{name}'")),
                RemoveOutcome::DataMissing => out::print_warn(&format!(
                    "Removed '{name}', but the synced data was already gone"
                )),
            }
            Ok(())
        }
        Command::Relink { name } if name.as_str() == "*" => {
            print_tally("relink", &engine.relink_all());
            Ok(())
        }
        Command::Relink { name } => {
            match engine.relink(name)? {
                RelinkOutcome::Intact => {
                    out::print_info(&format!("'{name}' is already linked correctly"))
                }
                RelinkOutcome::Repaired => out::print_success(&format!("Repaired '{name}'")),
            }
            Ok(())
        }
        Command::List => {
            let links = engine.registry().links();
            if links.is_empty() {
                out::print_info("No links are currently managed.");
                return Ok(());
            }
            for (name, record) in &links {
                out::print_user(&format!(
                    "{name}  [{}]  {} -> {}  (created {})",
                    record.kind,
                    record.original_path.display(),
                    record.synced_path.display(),
                    record.created_at.format("%Y-%m-%d %H:%M:%S"),
                ));
            }
            out::print_user(&format!("{} link(s) managed.", links.len()));
            Ok(())
        }
        Command::Config { action } => run_config(engine, action),
    }
}

fn resolve_sync_dir(engine: &LinkEngine, flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return fs_ops::absolute(dir);
    }
    match engine.registry().default_sync_dir() {
        Some(dir) => Ok(dir),
        None => bail!(
            "no sync directory configured; pass --sync-dir or run \
             `synclink config set default-sync-dir <path>`"
        ),
    }
}

fn run_config(engine: &LinkEngine, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Get { key } if key == "default-sync-dir" => {
            match engine.registry().default_sync_dir() {
                Some(dir) => out::print_user(&format!("default-sync-dir: {}", dir.display())),
                None => out::print_user("default-sync-dir is not set"),
            }
            Ok(())
        }
        ConfigAction::Set { key, value } if key == "default-sync-dir" => {
            engine.registry().set_default_sync_dir(Path::new(value))?;
            out::print_success(&format!("default-sync-dir set to {value}"));
            Ok(())
        }
        ConfigAction::Get { key } | ConfigAction::Set { key, .. } => {
            bail!("unknown configuration key '{key}' (supported: default-sync-dir)")
        }
    }
}

fn print_tally(op: &str, report: &BulkReport) {
    out::print_user(&format!(
        "{op}: {} total, {} succeeded, {} failed",
        report.total, report.succeeded, report.failed
    ));
    for failure in &report.failures {
        out::print_error(&format!("  {}: {}", failure.name, failure.error));
    }
}

fn report_error(e: &anyhow::Error) {
    let msg = format!("{e:#}");
    if let Some(typed) = e.downcast_ref::<SyncLinkError>() {
        error!(code = typed.code(), error = %msg, "Operation failed");
    } else {
        error!(error = %msg, "Operation failed");
    }
}
