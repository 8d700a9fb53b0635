#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use synclink::registry::{LinkKind, Registry};
use synclink::{LinkEngine, SyncLinkError};
use tempfile::tempdir;

fn engine_at(root: &Path) -> LinkEngine {
    let registry = Registry::load_from(root.join("registry.json")).unwrap();
    LinkEngine::new(Arc::new(registry), None)
}

#[test]
fn occupied_original_path_refuses_the_relink() {
    let td = tempdir().unwrap();
    let root = fs::canonicalize(td.path()).unwrap();
    let sync = root.join("sync");
    let target = root.join("app.conf");
    fs::write(&target, "data").unwrap();

    let engine = engine_at(&root);
    engine
        .create(&target, "cfg", &sync, LinkKind::Symlink)
        .unwrap();

    // A real file replaced the redirect: manual territory.
    fs::remove_file(&target).unwrap();
    fs::write(&target, "not a symlink").unwrap();

    let err = engine.relink("cfg").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SyncLinkError>(),
        Some(SyncLinkError::Conflict { .. })
    ));

    // Unlike the unlink conflict, the record stays for a later resolution.
    assert!(engine.registry().get("cfg").is_some());
    assert_eq!(fs::read_to_string(&target).unwrap(), "not a symlink");
}

#[test]
fn missing_synced_source_fails_the_repair() {
    let td = tempdir().unwrap();
    let root = fs::canonicalize(td.path()).unwrap();
    let sync = root.join("sync");
    let target = root.join("app.conf");
    fs::write(&target, "data").unwrap();

    let engine = engine_at(&root);
    let record = engine
        .create(&target, "cfg", &sync, LinkKind::Symlink)
        .unwrap();

    // Both the redirect and the synced data are gone: nothing to relink to.
    fs::remove_file(&target).unwrap();
    fs::remove_file(&record.synced_path).unwrap();

    let err = engine.relink("cfg").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SyncLinkError>(),
        Some(SyncLinkError::SyncedPathMissing(_))
    ));
    assert!(fs::symlink_metadata(&target).is_err(), "no redirect conjured up");
}
