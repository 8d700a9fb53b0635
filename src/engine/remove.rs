//! Remove: tear down the redirect, restore data for the symlink kind, then
//! drop the registry record. Physical work happens before bookkeeping, so a
//! late failure reads as "done on disk, registry behind", never the reverse.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::errors::SyncLinkError;
use crate::fs_ops;
use crate::registry::{LinkKind, LinkRecord};

use super::LinkEngine;

/// What a successful remove actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Redirect gone; data moved back (symlink) or artifact deleted (shortcut).
    Restored,
    /// The synced data had already disappeared; only the redirect and the
    /// registry record were cleaned up.
    DataMissing,
}

impl LinkEngine {
    /// Remove the link `name`, dispatching on the recorded kind.
    pub fn remove(&self, name: &str) -> Result<RemoveOutcome> {
        let record = self.lookup(name)?;
        match record.kind {
            LinkKind::Symlink => self.remove_symlink(name),
            LinkKind::Shortcut => self.remove_shortcut(name),
        }
    }

    /// Remove a symlink-kind link: delete the redirect, move the synced data
    /// back, then drop the record.
    pub fn remove_symlink(&self, name: &str) -> Result<RemoveOutcome> {
        let record = self.lookup_kind(name, LinkKind::Symlink)?;
        let original = record.original_path.as_path();
        let synced = record.synced_path.as_path();

        let original_present = fs::symlink_metadata(original).is_ok();
        let is_link = fs_ops::is_symlink(original);

        if original_present && is_link {
            match fs::read_link(original) {
                Ok(current) if current != synced => warn!(
                    path = %original.display(),
                    points_at = %current.display(),
                    expected = %synced.display(),
                    "Symlink target differs from the registry; removing anyway"
                ),
                Err(e) => {
                    warn!(path = %original.display(), error = %e, "Could not read symlink target")
                }
                _ => {}
            }
            fs::remove_file(original)
                .with_context(|| format!("remove symlink '{}'", original.display()))?;
        } else if original_present {
            // The original slot holds real content, not our redirect.
            if !is_effectively_empty(original) {
                return Err(self.conflict_dropping_record(name, original, synced).into());
            }
            warn!(path = %original.display(), "Original path holds an empty non-symlink; replacing it");
            remove_empty_placeholder(original)?;
        }

        let restored = if fs::symlink_metadata(synced).is_ok() {
            fs_ops::move_entry(synced, original).with_context(|| {
                format!(
                    "move '{}' back to '{}'; the redirect is already gone, manual recovery may be needed",
                    synced.display(),
                    original.display()
                )
            })?;
            true
        } else {
            warn!(path = %synced.display(), "Synced data is missing; nothing to move back");
            false
        };

        self.registry()
            .remove(name)
            .context("redirect removed on disk, but the registry update failed")?;

        info!(name, "Removed symlink redirect");
        Ok(if restored {
            RemoveOutcome::Restored
        } else {
            RemoveOutcome::DataMissing
        })
    }

    /// Remove a shortcut-kind link. Capability trouble (absent provider,
    /// unresolvable directory, failed delete) is logged and the registry
    /// cleanup still runs; artifact removal itself is idempotent.
    pub fn remove_shortcut(&self, name: &str) -> Result<RemoveOutcome> {
        self.lookup_kind(name, LinkKind::Shortcut)?;

        match self.provider() {
            None => warn!(
                name,
                "Shortcut capability unavailable on this platform; removing only the registry record"
            ),
            Some(provider) => match provider.shortcut_dir() {
                Err(e) => warn!(
                    name,
                    error = %format!("{e:#}"),
                    "Could not resolve the shortcut directory; removing only the registry record"
                ),
                Ok(dir) => {
                    if let Err(e) = provider.remove(name, &dir) {
                        warn!(
                            name,
                            error = %format!("{e:#}"),
                            "Could not remove the shortcut artifact; continuing with registry cleanup"
                        );
                    }
                }
            },
        }

        self.registry()
            .remove(name)
            .context("shortcut handled, but the registry update failed")?;

        info!(name, "Removed shortcut redirect");
        Ok(RemoveOutcome::Restored)
    }

    /// Non-empty user data occupies the original path: refuse to move the
    /// synced copy over it, drop the record, and report the conflict
    /// distinctly from success.
    fn conflict_dropping_record(&self, name: &str, original: &Path, synced: &Path) -> SyncLinkError {
        let mut detail = format!(
            "path exists, is not a symlink and is not empty; refusing to move '{}' over it",
            synced.display()
        );
        match self.registry().remove(name) {
            Ok(_) => detail.push_str(" (registry record removed)"),
            Err(e) => {
                warn!(name, error = %format!("{e:#}"), "Conflict cleanup could not persist the registry");
                detail.push_str(" (registry record removal failed to persist)");
            }
        }
        SyncLinkError::Conflict {
            path: original.to_path_buf(),
            detail,
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Result<LinkRecord> {
        self.registry()
            .get(name)
            .ok_or_else(|| SyncLinkError::UnknownLink(name.to_string()).into())
    }

    pub(crate) fn lookup_kind(&self, name: &str, expected: LinkKind) -> Result<LinkRecord> {
        let record = self.lookup(name)?;
        if record.kind != expected {
            return Err(SyncLinkError::KindMismatch {
                name: name.to_string(),
                expected,
                actual: record.kind,
            }
            .into());
        }
        Ok(record)
    }
}

/// Empty file (zero bytes) or empty directory.
fn is_effectively_empty(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => fs::read_dir(path)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false),
        Ok(meta) => meta.len() == 0,
        Err(_) => false,
    }
}

fn remove_empty_placeholder(path: &Path) -> Result<()> {
    let meta = fs::metadata(path).with_context(|| format!("stat '{}'", path.display()))?;
    let removed = if meta.is_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    };
    removed.with_context(|| format!("clear empty placeholder at '{}'", path.display()))
}
