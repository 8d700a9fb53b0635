//! Verified copy helpers backing the cross-device fallback.
//! Files stream through buffered I/O and are length-checked against the
//! source before the copy counts. Permission and mtime mirroring is
//! best-effort: the payload already arrived intact, so a mirroring failure
//! downgrades to a warning.

use anyhow::{bail, Context, Result};
use filetime::FileTime;
use rayon::prelude::*;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

const COPY_BUF_SIZE: usize = 1024 * 1024;

/// Copy a single regular file to `dst`, overwriting any existing file there.
/// Returns the number of bytes written.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create destination directory '{}'", parent.display()))?;
    }

    let src_f = File::open(src).with_context(|| format!("open source file '{}'", src.display()))?;
    let src_meta = src_f
        .metadata()
        .with_context(|| format!("stat source file '{}'", src.display()))?;

    let dst_f = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(dst)
        .with_context(|| format!("create destination file '{}'", dst.display()))?;

    let mut reader = BufReader::with_capacity(COPY_BUF_SIZE, src_f);
    let mut writer = BufWriter::with_capacity(COPY_BUF_SIZE, dst_f);
    let bytes = io::copy(&mut reader, &mut writer)
        .with_context(|| format!("copy '{}' -> '{}'", src.display(), dst.display()))?;
    writer
        .flush()
        .with_context(|| format!("flush destination file '{}'", dst.display()))?;
    if let Err(e) = writer.get_ref().sync_all() {
        warn!(path = %dst.display(), error = %e, "Could not sync copied file to disk");
    }
    drop(writer);

    if bytes != src_meta.len() {
        let _ = fs::remove_file(dst);
        bail!(
            "short copy '{}' -> '{}': wrote {} of {} bytes",
            src.display(),
            dst.display(),
            bytes,
            src_meta.len()
        );
    }

    if let Err(e) = fs::set_permissions(dst, src_meta.permissions()) {
        warn!(path = %dst.display(), error = %e, "Could not mirror permissions onto copy");
    }
    let mtime = FileTime::from_last_modification_time(&src_meta);
    if let Err(e) = filetime::set_file_mtime(dst, mtime) {
        warn!(path = %dst.display(), error = %e, "Could not mirror mtime onto copy");
    }

    Ok(bytes)
}

/// Recursively copy a directory tree from `src` to `dst`.
/// Directories are created with the source's permissions; non-regular
/// entries (device nodes, sockets, nested symlinks) are skipped with a
/// notice. File payloads fan out in parallel once the skeleton exists.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    let src_meta = fs::metadata(src).with_context(|| format!("stat '{}'", src.display()))?;
    if !src_meta.is_dir() {
        bail!("source '{}' is not a directory", src.display());
    }

    fs::create_dir_all(dst).with_context(|| format!("create directory '{}'", dst.display()))?;
    mirror_dir_permissions(&src_meta, dst);

    // Build the directory skeleton first so the parallel copies never race
    // on mkdir.
    let mut files = Vec::new();
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.with_context(|| format!("walk '{}'", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("relativize '{}'", entry.path().display()))?;
        let target = dst.join(rel);

        let ftype = entry.file_type();
        if ftype.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("create directory '{}'", target.display()))?;
            if let Ok(meta) = entry.metadata() {
                mirror_dir_permissions(&meta, &target);
            }
        } else if ftype.is_file() {
            files.push((entry.into_path(), target));
        } else {
            warn!(path = %entry.path().display(), "Skipping non-regular entry during copy");
        }
    }

    files.par_iter().try_for_each(|(from, to)| -> Result<()> {
        copy_file(from, to)?;
        Ok(())
    })?;

    Ok(())
}

fn mirror_dir_permissions(meta: &fs::Metadata, dst: &Path) {
    if let Err(e) = fs::set_permissions(dst, meta.permissions()) {
        warn!(path = %dst.display(), error = %e, "Could not mirror directory permissions");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copy_file_verifies_length_and_content() {
        let td = tempdir().unwrap();
        let src = td.path().join("src.bin");
        let dst = td.path().join("out").join("dst.bin");

        let data: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        fs::write(&src, &data).unwrap();

        let n = copy_file(&src, &dst).unwrap();
        assert_eq!(n, data.len() as u64);
        assert_eq!(fs::read(&dst).unwrap(), data);
    }

    #[test]
    fn copy_file_overwrites_existing_destination() {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        let dst = td.path().join("dst");
        fs::write(&src, b"fresh").unwrap();
        fs::write(&dst, b"stale-and-longer").unwrap();

        copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"fresh");
    }

    #[test]
    fn copy_tree_reproduces_nested_layout() {
        let td = tempdir().unwrap();
        let src = td.path().join("tree");
        fs::create_dir_all(src.join("sub/deeper")).unwrap();
        fs::write(src.join("one.txt"), "one").unwrap();
        fs::write(src.join("sub/two.txt"), "two").unwrap();
        fs::write(src.join("sub/deeper/three.txt"), "three").unwrap();

        let dst = td.path().join("out");
        copy_tree(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("one.txt")).unwrap(), "one");
        assert_eq!(fs::read_to_string(dst.join("sub/two.txt")).unwrap(), "two");
        assert_eq!(
            fs::read_to_string(dst.join("sub/deeper/three.txt")).unwrap(),
            "three"
        );
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_skips_nested_symlinks() {
        let td = tempdir().unwrap();
        let src = td.path().join("tree");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("real.txt"), "real").unwrap();
        std::os::unix::fs::symlink(src.join("real.txt"), src.join("alias")).unwrap();

        let dst = td.path().join("out");
        copy_tree(&src, &dst).unwrap();

        assert!(dst.join("real.txt").exists());
        assert!(!dst.join("alias").exists(), "symlinks are skipped, not copied");
    }
}
