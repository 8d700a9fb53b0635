//! Relink: re-derive the physical state of a redirect and repair it only
//! when it diverges from the registry record. An original path occupied by
//! something that is not our redirect is a conflict left for the user.

use anyhow::{Context, Result};
use std::fs;
use tracing::{info, warn};

use crate::errors::SyncLinkError;
use crate::fs_ops;
use crate::registry::LinkKind;

use super::LinkEngine;

/// Result of a successful relink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelinkOutcome {
    /// The redirect was already correct; nothing was touched.
    Intact,
    /// The redirect was missing or stale and has been recreated.
    Repaired,
}

impl LinkEngine {
    /// Reconcile the link `name`, dispatching on the recorded kind.
    pub fn relink(&self, name: &str) -> Result<RelinkOutcome> {
        let record = self.lookup(name)?;
        match record.kind {
            LinkKind::Symlink => self.relink_symlink(name),
            LinkKind::Shortcut => self.relink_shortcut(name),
        }
    }

    pub fn relink_symlink(&self, name: &str) -> Result<RelinkOutcome> {
        let record = self.lookup_kind(name, LinkKind::Symlink)?;
        let original = record.original_path.as_path();
        let synced = record.synced_path.as_path();

        let needs_repair = match fs::symlink_metadata(original) {
            Err(_) => {
                info!(path = %original.display(), "Redirect is missing; recreating");
                true
            }
            Ok(meta) if !meta.file_type().is_symlink() => {
                return Err(SyncLinkError::Conflict {
                    path: record.original_path.clone(),
                    detail: "path exists but is not a symlink; resolve manually before relinking"
                        .into(),
                }
                .into());
            }
            Ok(_) => match fs::read_link(original) {
                Ok(current) if current == synced => false,
                Ok(current) => {
                    info!(
                        path = %original.display(),
                        points_at = %current.display(),
                        expected = %synced.display(),
                        "Redirect points elsewhere; correcting"
                    );
                    fs::remove_file(original)
                        .with_context(|| format!("remove stale symlink '{}'", original.display()))?;
                    true
                }
                Err(e) => {
                    warn!(path = %original.display(), error = %e, "Symlink target unreadable; recreating");
                    fs::remove_file(original).with_context(|| {
                        format!("remove unreadable symlink '{}'", original.display())
                    })?;
                    true
                }
            },
        };

        if !needs_repair {
            return Ok(RelinkOutcome::Intact);
        }

        let synced_meta = fs::metadata(synced)
            .map_err(|_| SyncLinkError::SyncedPathMissing(record.synced_path.clone()))?;
        fs_ops::create_symlink(synced, original, synced_meta.is_dir())
            .with_context(|| format!("recreate symlink at '{}'", original.display()))?;

        info!(name, path = %original.display(), "Redirect recreated");
        Ok(RelinkOutcome::Repaired)
    }

    pub fn relink_shortcut(&self, name: &str) -> Result<RelinkOutcome> {
        let record = self.lookup_kind(name, LinkKind::Shortcut)?;
        let provider = self
            .provider()
            .ok_or(SyncLinkError::ShortcutUnsupported)?;
        let dir = provider
            .shortcut_dir()
            .context("resolve the shortcut directory")?;

        if provider.verify_or_recreate(name, &dir, &record)? {
            info!(name, "Shortcut artifact recreated");
            Ok(RelinkOutcome::Repaired)
        } else {
            Ok(RelinkOutcome::Intact)
        }
    }
}
