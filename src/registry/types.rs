//! Registry data shapes as persisted to disk.
//! The on-disk document is pretty-printed JSON: `{ settings, links, version }`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Version tag stamped into every persisted registry.
pub const SCHEMA_VERSION: &str = "1";

/// Which kind of redirect a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// The data was moved into the sync directory; a symlink points at it.
    Symlink,
    /// The data stays in place; a launcher shortcut points at it.
    Shortcut,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::Symlink => f.write_str("symlink"),
            LinkKind::Shortcut => f.write_str("shortcut"),
        }
    }
}

/// One managed redirect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRecord {
    pub kind: LinkKind,
    /// Absolute path where the redirect is visible to the user. Fixed for
    /// the lifetime of the record.
    pub original_path: PathBuf,
    /// Where the relocated data (symlink kind) or the shortcut artifact
    /// (shortcut kind) actually lives.
    pub synced_path: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// General settings persisted alongside the link table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub default_sync_dir: Option<PathBuf>,
}

/// Root of the persisted registry document.
///
/// `#[serde(default)]` on every field keeps additive layout changes loadable;
/// a `{}` on disk parses to an empty registry rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryData {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub links: BTreeMap<String, LinkRecord>,
    #[serde(default)]
    pub version: String,
}

impl Default for RegistryData {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            links: BTreeMap::new(),
            version: SCHEMA_VERSION.to_string(),
        }
    }
}
