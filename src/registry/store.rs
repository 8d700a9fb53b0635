//! Registry store: in-memory state behind a RwLock, rewritten wholesale to
//! disk on every mutation.
//!
//! Consistency contract:
//! - Reads return value copies; callers never hold a live reference.
//! - Writers hold the exclusive lock across mutate + persist, never across a
//!   physical move or symlink operation.
//! - A failed persist is reported as an error, but the in-memory mutation
//!   stands: disk trails memory until the next successful persist.

use anyhow::{anyhow, Context, Result};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

use crate::fs_ops::{fsync_dir, unique_temp_path};

use super::paths::registry_path;
use super::types::{LinkRecord, RegistryData, SCHEMA_VERSION};

pub struct Registry {
    path: PathBuf,
    state: RwLock<RegistryData>,
}

impl Registry {
    /// Load the registry from its default location.
    pub fn load() -> Result<Self> {
        Self::load_from(registry_path()?)
    }

    /// Load the registry from an explicit path.
    ///
    /// - Missing file: an empty registry is synthesized and persisted
    ///   immediately.
    /// - Empty file, `{}` or `null`: tolerated with a warning; an empty
    ///   in-memory registry is substituted.
    /// - Older `version` tag: tolerated with a warning; the in-memory copy
    ///   is stamped with the current version. No field migration happens.
    /// - Unreadable path or unparsable non-trivial content: load fails.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No registry file found; creating an empty one");
                let registry = Self {
                    path,
                    state: RwLock::new(RegistryData::default()),
                };
                let state = registry.read_state();
                registry
                    .persist(&state)
                    .with_context(|| format!("initialize registry at '{}'", registry.path.display()))?;
                drop(state);
                return Ok(registry);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read registry file '{}'", path.display()));
            }
        };

        let data = Self::parse(&path, &raw)?;
        Ok(Self {
            path,
            state: RwLock::new(data),
        })
    }

    fn parse(path: &Path, raw: &str) -> Result<RegistryData> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "{}" || trimmed == "null" {
            warn!(path = %path.display(), "Registry file is empty; starting from an empty registry");
            return Ok(RegistryData::default());
        }

        let mut data: RegistryData = serde_json::from_str(trimmed)
            .with_context(|| format!("parse registry file '{}'", path.display()))?;
        if data.version != SCHEMA_VERSION {
            warn!(
                found = %data.version,
                expected = SCHEMA_VERSION,
                "Registry schema version differs; continuing with the current version"
            );
            data.version = SCHEMA_VERSION.to_string();
        }
        Ok(data)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a single record. Returns a copy.
    pub fn get(&self, name: &str) -> Option<LinkRecord> {
        self.read_state().links.get(name).cloned()
    }

    /// Snapshot of the full link table. Mutating the result never affects
    /// registry state.
    pub fn links(&self) -> BTreeMap<String, LinkRecord> {
        self.read_state().links.clone()
    }

    /// Insert or overwrite a record, then persist.
    pub fn insert(&self, name: &str, record: LinkRecord) -> Result<()> {
        let mut state = self.write_state();
        state.links.insert(name.to_string(), record);
        self.persist(&state).with_context(|| {
            format!("link '{name}' recorded in memory, but persisting the registry failed")
        })
    }

    /// Remove a record, returning whether it existed. Persists only when a
    /// deletion actually happened; a failed persist still reflects it.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let mut state = self.write_state();
        if state.links.remove(name).is_none() {
            return Ok(false);
        }
        self.persist(&state).map(|()| true).with_context(|| {
            format!("link '{name}' removed from memory, but persisting the registry failed")
        })
    }

    pub fn default_sync_dir(&self) -> Option<PathBuf> {
        self.read_state().settings.default_sync_dir.clone()
    }

    pub fn set_default_sync_dir(&self, dir: &Path) -> Result<()> {
        let abs = crate::fs_ops::absolute(dir)?;
        let mut state = self.write_state();
        state.settings.default_sync_dir = Some(abs);
        self.persist(&state)
            .context("sync directory updated in memory, but persisting the registry failed")
    }

    /// Serialize the full document and rewrite the registry file (temp file
    /// in the same directory, fsync, atomic rename, directory fsync), under
    /// an advisory lock so concurrent processes don't interleave.
    fn persist(&self, data: &RegistryData) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(data).context("serialize registry")?;
        let _file_lock = SidecarLock::acquire(&self.path)?;
        write_whole_file(&self.path, &bytes)
    }

    // A poisoned lock only means another thread panicked mid-operation; the
    // map itself is still coherent, so recover the guard instead of
    // propagating the panic.
    fn read_state(&self) -> RwLockReadGuard<'_, RegistryData> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RegistryData> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Advisory lock on a sidecar file next to the registry, held for the
/// duration of one whole-file rewrite.
struct SidecarLock {
    file: fs::File,
}

impl SidecarLock {
    fn acquire(registry_file: &Path) -> Result<Self> {
        let mut name = registry_file.as_os_str().to_owned();
        name.push(".lock");
        let lock_path = PathBuf::from(name);

        if let Some(parent) = registry_file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create registry directory '{}'", parent.display()))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&lock_path)
            .with_context(|| format!("open registry lock file '{}'", lock_path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("lock registry lock file '{}'", lock_path.display()))?;
        Ok(Self { file })
    }
}

impl Drop for SidecarLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn write_whole_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow!("registry path has no parent directory: {}", path.display()))?;

    let tmp = unique_temp_path(dir);
    let result = (|| -> Result<()> {
        let mut f = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp)
            .with_context(|| format!("create temp file '{}'", tmp.display()))?;
        f.write_all(bytes)
            .with_context(|| format!("write temp file '{}'", tmp.display()))?;
        f.sync_all()
            .with_context(|| format!("sync temp file '{}'", tmp.display()))?;
        drop(f);

        fs::rename(&tmp, path)
            .with_context(|| format!("rename '{}' -> '{}'", tmp.display(), path.display()))?;
        let _ = fsync_dir(dir);
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
