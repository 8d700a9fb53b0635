//! Registry file location.
//! `$SYNCLINK_REGISTRY` overrides; the default sits beside the executable so
//! the registry travels with a portable install.

use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;

pub const REGISTRY_FILE_NAME: &str = "registry.json";

/// Resolve the registry file path for this process.
pub fn registry_path() -> Result<PathBuf> {
    if let Ok(p) = env::var("SYNCLINK_REGISTRY") {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p));
        }
    }

    let exe = env::current_exe().context("determine executable path")?;
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent directory: {}", exe.display()))?;
    Ok(dir.join(REGISTRY_FILE_NAME))
}
