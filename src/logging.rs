//! Tracing initialization.
//! Builds a subscriber with EnvFilter, compact or JSON stdout output, and an
//! optional non-blocking file layer.
//!
//! Behavior:
//! - Verbosity is driven by [`LogLevel`]; there is no RUST_LOG override.
//! - File logging is refused when any ancestor of the log path is a symlink.
//! - The returned WorkerGuard must be held until exit so file logs flush.

use anyhow::Result;
use chrono::Local;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::util::SubscriberInitExt;

/// Verbosity levels exposed to users.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More detail
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common names into a LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Human-friendly timestamp formatter (DD/MM/YY HH:MM:SS).
struct LocalHumanTime;
impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%d/%m/%y %H:%M:%S"))
    }
}

#[inline]
fn env_filter_for(lvl: &LogLevel) -> EnvFilter {
    let level_filter = match lvl {
        LogLevel::Quiet => LevelFilter::ERROR,
        LogLevel::Normal => LevelFilter::INFO,
        LogLevel::Info => LevelFilter::DEBUG,
        LogLevel::Debug => LevelFilter::TRACE,
    };
    EnvFilter::new(level_filter.to_string())
}

/// Return true if any existing ancestor of `path` is a symlink.
fn path_has_symlink_ancestor(path: &Path) -> std::io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}

/// Open a non-blocking append writer for the log file, or explain on stderr
/// why file logging stays off.
fn maybe_open_non_blocking_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    match path_has_symlink_ancestor(path) {
        Ok(true) => {
            eprintln!(
                "Refusing file logging: an ancestor of {} is a symlink; logging to stdout only.",
                path.display()
            );
            return None;
        }
        Err(e) => {
            eprintln!(
                "Could not check log path {} for symlinked ancestors: {e}; logging to stdout only.",
                path.display()
            );
            return None;
        }
        Ok(false) => {}
    }

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    match fs::OpenOptions::new().append(true).create(true).open(path) {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            Some((writer, guard))
        }
        Err(e) => {
            eprintln!("Failed to open log file {}: {e}; logging to stdout only.", path.display());
            None
        }
    }
}

/// Initialize tracing. Returns a WorkerGuard when a file appender was set
/// up; hold it until shutdown so buffered file logs flush.
pub fn init_tracing(
    lvl: &LogLevel,
    log_file: Option<&Path>,
    json: bool,
) -> Result<Option<WorkerGuard>> {
    let env_filter = env_filter_for(lvl);

    // The fmt layer types differ per format, so each combination is built
    // and initialized in its own arm.
    let file_writer = log_file.and_then(maybe_open_non_blocking_writer);

    match (file_writer, json) {
        (Some((writer, guard)), true) => {
            let stdout_layer = tsfmt::layer()
                .event_format(tsfmt::format().json())
                .with_timer(LocalHumanTime)
                .with_target(true);
            let file_layer = tsfmt::layer()
                .event_format(tsfmt::format().json())
                .with_timer(LocalHumanTime)
                .with_target(true)
                .with_writer(writer);
            registry().with(env_filter).with(stdout_layer).with(file_layer).init();
            Ok(Some(guard))
        }
        (Some((writer, guard)), false) => {
            let stdout_layer = tsfmt::layer()
                .with_timer(LocalHumanTime)
                .with_target(true)
                .compact();
            let file_layer = tsfmt::layer()
                .with_timer(LocalHumanTime)
                .with_target(true)
                .compact()
                .with_writer(writer);
            registry().with(env_filter).with(stdout_layer).with(file_layer).init();
            Ok(Some(guard))
        }
        (None, true) => {
            let stdout_layer = tsfmt::layer()
                .event_format(tsfmt::format().json())
                .with_timer(LocalHumanTime)
                .with_target(true);
            registry().with(env_filter).with(stdout_layer).init();
            Ok(None)
        }
        (None, false) => {
            let stdout_layer = tsfmt::layer()
                .with_timer(LocalHumanTime)
                .with_target(true)
                .compact();
            registry().with(env_filter).with(stdout_layer).init();
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parsing_accepts_aliases() {
        assert_eq!(LogLevel::parse("QUIET"), Some(LogLevel::Quiet));
        assert_eq!(LogLevel::parse("error"), Some(LogLevel::Quiet));
        assert_eq!(LogLevel::parse("normal"), Some(LogLevel::Normal));
        assert_eq!(LogLevel::parse("verbose"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("trace"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("nope"), None);
    }

    #[test]
    fn level_display_roundtrips_through_fromstr() {
        for lvl in [LogLevel::Quiet, LogLevel::Normal, LogLevel::Info, LogLevel::Debug] {
            assert_eq!(lvl.to_string().parse::<LogLevel>().unwrap(), lvl);
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_ancestors_are_detected() {
        let td = tempfile::tempdir().unwrap();
        let real = td.path().join("real");
        fs::create_dir_all(&real).unwrap();
        let alias = td.path().join("alias");
        std::os::unix::fs::symlink(&real, &alias).unwrap();

        assert!(path_has_symlink_ancestor(&alias.join("app.log")).unwrap());
        assert!(!path_has_symlink_ancestor(&real.join("app.log")).unwrap());
    }
}
