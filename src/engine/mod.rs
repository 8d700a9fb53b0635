//! Link lifecycle engine.
//! Orchestrates the move primitive, the registry and the platform shortcut
//! capability into create / remove / relink operations plus the bulk
//! variants.
//!
//! Per-name state machine: Absent → Linked → Broken → Linked (relink) or
//! Absent (remove). Shortcut and symlink kinds share these states; only the
//! transition bodies differ.
//!
//! Registry writes happen under its own exclusive lock; physical filesystem
//! work never holds that lock, so a slow move doesn't block unrelated reads.

mod bulk;
mod create;
mod relink;
mod remove;

pub use bulk::{BulkFailure, BulkReport};
pub use relink::RelinkOutcome;
pub use remove::RemoveOutcome;

use std::sync::Arc;

use crate::platform::ShortcutProvider;
use crate::registry::Registry;

pub struct LinkEngine {
    registry: Arc<Registry>,
    shortcuts: Option<Arc<dyn ShortcutProvider>>,
}

impl LinkEngine {
    pub fn new(registry: Arc<Registry>, shortcuts: Option<Arc<dyn ShortcutProvider>>) -> Self {
        Self { registry, shortcuts }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn provider(&self) -> Option<&dyn ShortcutProvider> {
        self.shortcuts.as_deref()
    }
}
