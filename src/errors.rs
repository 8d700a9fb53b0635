//! Typed error definitions for synclink.
//! Provides the well-known failure modes for better logs and tests; anything
//! outside this set travels as a plain anyhow context chain.

use std::path::PathBuf;
use thiserror::Error;

use crate::registry::LinkKind;

#[derive(Debug, Error)]
pub enum SyncLinkError {
    #[error("Target path not found: {0}")]
    TargetNotFound(PathBuf),

    #[error("Target is neither a regular file nor a directory: {0}")]
    UnsupportedTarget(PathBuf),

    #[error("Link name '{0}' is already registered")]
    DuplicateName(String),

    #[error("No link named '{0}' is registered")]
    UnknownLink(String),

    #[error("Link '{name}' is a {actual} link, not a {expected} link")]
    KindMismatch {
        name: String,
        expected: LinkKind,
        actual: LinkKind,
    },

    #[error("Sync destination already exists: {0}")]
    SyncDestinationExists(PathBuf),

    #[error("Conflict at {path}: {detail}")]
    Conflict { path: PathBuf, detail: String },

    #[error("Synced data missing at {0}; nothing to restore or relink to")]
    SyncedPathMissing(PathBuf),

    #[error("Shortcut links are not supported on this platform")]
    ShortcutUnsupported,
}

impl SyncLinkError {
    /// Stable machine-readable code for structured log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TargetNotFound(_) => "target_not_found",
            Self::UnsupportedTarget(_) => "unsupported_target",
            Self::DuplicateName(_) => "duplicate_name",
            Self::UnknownLink(_) => "unknown_link",
            Self::KindMismatch { .. } => "kind_mismatch",
            Self::SyncDestinationExists(_) => "sync_destination_exists",
            Self::Conflict { .. } => "conflict",
            Self::SyncedPathMissing(_) => "synced_path_missing",
            Self::ShortcutUnsupported => "shortcut_unsupported",
        }
    }
}
