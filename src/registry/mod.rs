//! Durable link registry.
//! The name → record mapping plus settings, held in memory for the process
//! lifetime and rewritten wholesale to disk on every mutation.

mod paths;
mod store;
mod types;

pub use paths::{registry_path, REGISTRY_FILE_NAME};
pub use store::Registry;
pub use types::{LinkKind, LinkRecord, RegistryData, Settings, SCHEMA_VERSION};
