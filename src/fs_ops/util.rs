//! Small filesystem helpers shared across fs_ops and the engine.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Absolutize without resolving symlinks. `dunce` keeps Windows paths free
/// of the `\\?\` prefix; on Unix it is a no-op.
pub fn absolute(p: &Path) -> Result<PathBuf> {
    let abs = std::path::absolute(p)
        .with_context(|| format!("resolve absolute path for '{}'", p.display()))?;
    Ok(dunce::simplified(&abs).to_path_buf())
}

/// Lstat-based symlink check; a missing path is simply not a symlink.
pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// Create a symlink at `link` pointing at `target`.
#[cfg(unix)]
pub fn create_symlink(target: &Path, link: &Path, _target_is_dir: bool) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

/// Windows distinguishes file and directory symlinks.
#[cfg(windows)]
pub fn create_symlink(target: &Path, link: &Path, target_is_dir: bool) -> io::Result<()> {
    if target_is_dir {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

/// Flush directory metadata so a completed rename survives power loss.
#[cfg(unix)]
pub fn fsync_dir(dir: &Path) -> io::Result<()> {
    let f = fs::File::open(dir)?;
    f.sync_all()
}

#[cfg(not(unix))]
pub fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// Unique scratch path inside `dir` for write-then-rename sequences.
pub fn unique_temp_path(dir: &Path) -> PathBuf {
    let epoch_ms = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let pid = std::process::id();

    for n in 0u32..=5 {
        let candidate = dir.join(format!(".synclink-{pid}-{epoch_ms}-{n}.tmp"));
        if !candidate.exists() {
            return candidate;
        }
    }
    dir.join(format!(".synclink-{pid}-{epoch_ms}-final.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absolute_keeps_absolute_paths() {
        let td = tempdir().unwrap();
        let p = td.path().join("x");
        assert_eq!(absolute(&p).unwrap(), p);
    }

    #[test]
    fn absolute_resolves_relative_against_cwd() {
        let abs = absolute(Path::new("some/relative")).unwrap();
        assert!(abs.is_absolute());
        assert!(abs.ends_with("some/relative"));
    }

    #[test]
    fn temp_paths_avoid_existing_files() {
        let td = tempdir().unwrap();
        let first = unique_temp_path(td.path());
        fs::write(&first, b"x").unwrap();
        let second = unique_temp_path(td.path());
        assert_ne!(first, second);
        assert!(!second.exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_detection() {
        let td = tempdir().unwrap();
        let target = td.path().join("t");
        let link = td.path().join("l");
        fs::write(&target, b"x").unwrap();
        create_symlink(&target, &link, false).unwrap();
        assert!(is_symlink(&link));
        assert!(!is_symlink(&target));
        assert!(!is_symlink(&td.path().join("missing")));
    }
}
