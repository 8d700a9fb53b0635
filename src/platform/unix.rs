//! XDG desktop-entry shortcuts.
//! Artifacts are `.desktop` launcher files under the user's applications
//! directory. `SYNCLINK_SHORTCUT_DIR` overrides the location, which also
//! keeps sandboxed runs away from the real user data dir.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::ShortcutProvider;
use crate::registry::LinkRecord;

pub struct DesktopEntryProvider;

impl DesktopEntryProvider {
    fn artifact_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{name}.desktop"))
    }

    fn render(target: &Path, name: &str) -> String {
        format!(
            "[Desktop Entry]\n\
             Type=Application\n\
             Name={name}\n\
             Comment=Managed by synclink\n\
             Exec=xdg-open \"{}\"\n\
             Terminal=false\n",
            target.display()
        )
    }
}

impl ShortcutProvider for DesktopEntryProvider {
    fn shortcut_dir(&self) -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("SYNCLINK_SHORTCUT_DIR") {
            if !dir.trim().is_empty() {
                return Ok(PathBuf::from(dir));
            }
        }
        dirs::data_dir()
            .map(|d| d.join("applications"))
            .ok_or_else(|| anyhow!("could not determine the user data directory for shortcuts"))
    }

    fn create(&self, target: &Path, name: &str, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("create shortcut directory '{}'", dir.display()))?;
        let path = Self::artifact_path(dir, name);
        fs::write(&path, Self::render(target, name))
            .with_context(|| format!("write shortcut '{}'", path.display()))?;
        debug!(path = %path.display(), target = %target.display(), "Wrote desktop entry");
        Ok(path)
    }

    fn remove(&self, name: &str, dir: &Path) -> Result<()> {
        let path = Self::artifact_path(dir, name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove shortcut '{}'", path.display())),
        }
    }

    fn verify_or_recreate(&self, name: &str, dir: &Path, record: &LinkRecord) -> Result<bool> {
        let path = Self::artifact_path(dir, name);
        let wanted = Self::render(&record.original_path, name);
        match fs::read_to_string(&path) {
            Ok(existing) if existing == wanted => return Ok(false),
            Ok(_) => {
                debug!(path = %path.display(), "Desktop entry is stale; rewriting");
                self.remove(name, dir)?;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Desktop entry is missing; recreating");
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read shortcut '{}'", path.display()));
            }
        }
        self.create(&record.original_path, name, dir)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::LinkKind;
    use chrono::Utc;
    use tempfile::tempdir;

    fn record_for(target: &Path) -> LinkRecord {
        LinkRecord {
            kind: LinkKind::Shortcut,
            original_path: target.to_path_buf(),
            synced_path: PathBuf::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn create_remove_roundtrip_is_idempotent() {
        let td = tempdir().unwrap();
        let provider = DesktopEntryProvider;
        let target = td.path().join("tool");

        let artifact = provider.create(&target, "tool", td.path()).unwrap();
        assert!(artifact.exists());
        // Second create overwrites the same slot.
        let again = provider.create(&target, "tool", td.path()).unwrap();
        assert_eq!(artifact, again);

        provider.remove("tool", td.path()).unwrap();
        assert!(!artifact.exists());
        // Removing a missing artifact is success.
        provider.remove("tool", td.path()).unwrap();
    }

    #[test]
    fn verify_recreates_missing_and_stale_entries() {
        let td = tempdir().unwrap();
        let provider = DesktopEntryProvider;
        let target = td.path().join("tool");
        let record = record_for(&target);

        // Missing: recreated.
        assert!(provider.verify_or_recreate("tool", td.path(), &record).unwrap());
        // Correct: untouched.
        assert!(!provider.verify_or_recreate("tool", td.path(), &record).unwrap());

        // Stale: points somewhere else, gets rewritten.
        fs::write(
            DesktopEntryProvider::artifact_path(td.path(), "tool"),
            "[Desktop Entry]\nExec=xdg-open \"/somewhere/else\"\n",
        )
        .unwrap();
        assert!(provider.verify_or_recreate("tool", td.path(), &record).unwrap());
        let content =
            fs::read_to_string(DesktopEntryProvider::artifact_path(td.path(), "tool")).unwrap();
        assert!(content.contains(&target.display().to_string()));
    }
}
