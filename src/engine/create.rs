//! Create: relocate the target and leave a symlink (symlink kind), or emit a
//! platform shortcut while the target stays in place (shortcut kind), then
//! record the link. Physical work precedes bookkeeping, so a late registry
//! failure is reported as "filesystem ahead of registry", never swallowed.

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{error, info, warn};

use crate::errors::SyncLinkError;
use crate::fs_ops;
use crate::registry::{LinkKind, LinkRecord};

use super::LinkEngine;

impl LinkEngine {
    /// Create a managed redirect for `target` under `name`.
    /// `sync_dir` is consulted only for the symlink kind.
    pub fn create(
        &self,
        target: &Path,
        name: &str,
        sync_dir: &Path,
        kind: LinkKind,
    ) -> Result<LinkRecord> {
        match kind {
            LinkKind::Symlink => self.create_symlink(target, name, sync_dir),
            LinkKind::Shortcut => self.create_shortcut(target, name),
        }
    }

    fn create_symlink(&self, target: &Path, name: &str, sync_dir: &Path) -> Result<LinkRecord> {
        let original = fs_ops::absolute(target)?;
        let meta = match fs::metadata(&original) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SyncLinkError::TargetNotFound(original).into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("inspect target '{}'", original.display()));
            }
        };

        if self.registry().get(name).is_some() {
            return Err(SyncLinkError::DuplicateName(name.to_string()).into());
        }

        let synced = if meta.is_file() {
            let files_dir = sync_dir.join("files");
            fs::create_dir_all(&files_dir)
                .with_context(|| format!("create '{}'", files_dir.display()))?;
            files_dir.join(name)
        } else if meta.is_dir() {
            let dest = sync_dir.join(name);
            // Never clobber content already sitting in the sync directory.
            if dest.exists() {
                return Err(SyncLinkError::SyncDestinationExists(dest).into());
            }
            fs::create_dir_all(sync_dir)
                .with_context(|| format!("create '{}'", sync_dir.display()))?;
            dest
        } else {
            return Err(SyncLinkError::UnsupportedTarget(original).into());
        };

        info!(src = %original.display(), dest = %synced.display(), "Relocating into sync directory");
        fs_ops::move_entry(&original, &synced)
            .with_context(|| format!("move '{}' into the sync directory", original.display()))?;

        if let Err(e) = fs_ops::create_symlink(&synced, &original, meta.is_dir()) {
            // Compensating step: put the data back where it came from. Its
            // failure is reported on its own; it must not mask the original
            // error or crash the process.
            match fs_ops::move_entry(&synced, &original) {
                Ok(()) => {
                    warn!(path = %original.display(), "Symlink creation failed; data moved back")
                }
                Err(back) => error!(
                    synced = %synced.display(),
                    original = %original.display(),
                    error = %format!("{back:#}"),
                    "Rollback after failed symlink creation ALSO failed; the data needs manual recovery"
                ),
            }
            return Err(e).with_context(|| format!("create symlink at '{}'", original.display()));
        }

        let record = LinkRecord {
            kind: LinkKind::Symlink,
            original_path: original.clone(),
            synced_path: synced,
            created_at: Utc::now(),
        };
        self.registry()
            .insert(name, record.clone())
            .context("link is in place on disk, but recording it in the registry failed")?;

        info!(name, path = %original.display(), "Created symlink redirect");
        Ok(record)
    }

    fn create_shortcut(&self, target: &Path, name: &str) -> Result<LinkRecord> {
        let provider = self
            .provider()
            .ok_or(SyncLinkError::ShortcutUnsupported)?;

        let original = fs_ops::absolute(target)?;
        if !original.exists() {
            return Err(SyncLinkError::TargetNotFound(original).into());
        }
        if self.registry().get(name).is_some() {
            return Err(SyncLinkError::DuplicateName(name.to_string()).into());
        }

        let dir = provider
            .shortcut_dir()
            .context("resolve the shortcut directory")?;
        let artifact = provider.create(&original, name, &dir)?;

        let record = LinkRecord {
            kind: LinkKind::Shortcut,
            original_path: original,
            synced_path: artifact.clone(),
            created_at: Utc::now(),
        };
        if let Err(e) = self.registry().insert(name, record.clone()) {
            // The artifact exists but the record doesn't; take the artifact
            // back out rather than leaving an untracked shortcut behind.
            warn!(artifact = %artifact.display(), "Registry update failed; removing the shortcut just created");
            if let Err(rm) = provider.remove(name, &dir) {
                warn!(artifact = %artifact.display(), error = %format!("{rm:#}"), "Could not remove the orphaned shortcut");
            }
            return Err(e);
        }

        info!(name, artifact = %artifact.display(), "Created shortcut redirect");
        Ok(record)
    }
}
