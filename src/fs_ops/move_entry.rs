//! Rename-or-copy move.
//! Attempts an atomic rename; only a cross-device failure triggers the
//! copy+delete fallback. Any other rename error propagates untouched.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};

use super::atomic::{is_cross_device, try_atomic_move};
use super::copy::{copy_file, copy_tree};

/// Relocate a file or directory tree from `src` to `dst`.
pub fn move_entry(src: &Path, dst: &Path) -> Result<()> {
    match try_atomic_move(src, dst) {
        Ok(()) => {
            info!(src = %src.display(), dest = %dst.display(), "Renamed atomically");
            return Ok(());
        }
        Err(e) => {
            let cross = e
                .downcast_ref::<io::Error>()
                .map(is_cross_device)
                .unwrap_or(false);
            if !cross {
                return Err(e);
            }
            warn!(src = %src.display(), dest = %dst.display(), "Rename crossed devices; copying instead");
        }
    }

    let meta = fs::symlink_metadata(src).with_context(|| format!("stat '{}'", src.display()))?;
    let removed = if meta.is_dir() {
        copy_tree(src, dst)?;
        fs::remove_dir_all(src)
    } else {
        copy_file(src, dst)?;
        fs::remove_file(src)
    };

    // A source that survives its own copy means two live copies on disk.
    removed.with_context(|| {
        format!(
            "copied '{}' to '{}' but could not remove the source; both copies exist",
            src.display(),
            dst.display()
        )
    })?;

    info!(src = %src.display(), dest = %dst.display(), "Copied across devices and removed source");
    Ok(())
}
