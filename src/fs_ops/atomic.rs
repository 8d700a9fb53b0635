//! Atomic rename helper.
//! - Performs a rename with context-rich errors.
//! - On Windows, removes an existing destination file first (rename doesn't
//!   overwrite there).
//! - On Unix, best-effort fsync of the destination directory after rename.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::Path;

pub fn try_atomic_move(src: &Path, dst: &Path) -> Result<()> {
    #[cfg(windows)]
    {
        if dst.is_file() {
            if let Err(e) = fs::remove_file(dst) {
                if e.kind() != io::ErrorKind::NotFound {
                    return Err(e).with_context(|| {
                        format!("remove existing destination before rename: {}", dst.display())
                    });
                }
            }
        }
    }

    fs::rename(src, dst)
        .with_context(|| format!("rename '{}' -> '{}'", src.display(), dst.display()))?;

    #[cfg(unix)]
    if let Some(parent) = dst.parent() {
        // Ignore fsync errors rather than turning a successful rename into a failure.
        let _ = super::util::fsync_dir(parent);
    }

    Ok(())
}

/// True when `err` is the cross-device rename failure that warrants the
/// copy fallback.
#[cfg(unix)]
pub fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EXDEV)
}

/// ERROR_NOT_SAME_DEVICE on Windows.
#[cfg(not(unix))]
pub fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(17)
}
