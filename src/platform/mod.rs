//! Platform shortcut capability.
//! Hides OS differences behind a trait so the engine stays platform-agnostic.
//! A platform without an implementation yields `None` at startup, which the
//! engine reports as an unsupported operation rather than failing hard.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::registry::LinkRecord;

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::DesktopEntryProvider;

/// Shortcut-style redirects, supplied per host platform and injected into
/// the engine at startup.
pub trait ShortcutProvider: Send + Sync {
    /// The platform's canonical shortcut-storage location. Failure here is
    /// recoverable (a missing environment, not a broken process).
    fn shortcut_dir(&self) -> Result<PathBuf>;

    /// Create (or overwrite) the artifact for `name` pointing at `target`.
    /// Returns the artifact path. Safe to call again after a partial failure.
    fn create(&self, target: &Path, name: &str, dir: &Path) -> Result<PathBuf>;

    /// Remove the artifact for `name`. Removing a missing artifact succeeds.
    fn remove(&self, name: &str, dir: &Path) -> Result<()>;

    /// Ensure the artifact still targets `record.original_path`, deleting and
    /// recreating it when missing or stale. Returns true when it was
    /// recreated, false when it was already correct.
    fn verify_or_recreate(&self, name: &str, dir: &Path, record: &LinkRecord) -> Result<bool>;
}

/// Provider for the host platform, chosen once at startup.
#[cfg(unix)]
pub fn default_provider() -> Option<Arc<dyn ShortcutProvider>> {
    Some(Arc::new(DesktopEntryProvider))
}

#[cfg(not(unix))]
pub fn default_provider() -> Option<Arc<dyn ShortcutProvider>> {
    None
}
