use std::process::Command;
use tempfile::tempdir;

#[test]
fn help_succeeds() {
    let me = assert_cmd::cargo::cargo_bin!("synclink");
    let out = Command::new(me)
        .arg("--help")
        .output()
        .expect("spawn binary");
    assert!(out.status.success(), "binary should succeed with --help");
}

#[test]
fn list_with_isolated_registry_succeeds() {
    let td = tempdir().unwrap();
    let me = assert_cmd::cargo::cargo_bin!("synclink");
    let out = Command::new(me)
        .env("SYNCLINK_REGISTRY", td.path().join("registry.json"))
        .arg("list")
        .output()
        .expect("spawn binary");

    assert!(out.status.success(), "list should succeed on a fresh registry");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains("No links are currently managed"),
        "unexpected stdout: {stdout}"
    );
    assert!(
        td.path().join("registry.json").exists(),
        "a fresh registry file is synthesized on first load"
    );
}

#[test]
fn config_set_then_get_round_trips() {
    let td = tempdir().unwrap();
    let registry = td.path().join("registry.json");
    let sync = td.path().join("sync");
    let me = assert_cmd::cargo::cargo_bin!("synclink");

    let out = Command::new(&me)
        .env("SYNCLINK_REGISTRY", &registry)
        .args(["config", "set", "default-sync-dir"])
        .arg(&sync)
        .output()
        .expect("spawn binary");
    assert!(out.status.success(), "config set should succeed");

    let out = Command::new(&me)
        .env("SYNCLINK_REGISTRY", &registry)
        .args(["config", "get", "default-sync-dir"])
        .output()
        .expect("spawn binary");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains(&sync.display().to_string()), "got: {stdout}");
}

#[test]
fn unknown_config_keys_fail() {
    let td = tempdir().unwrap();
    let me = assert_cmd::cargo::cargo_bin!("synclink");
    let out = Command::new(me)
        .env("SYNCLINK_REGISTRY", td.path().join("registry.json"))
        .args(["config", "get", "no-such-key"])
        .output()
        .expect("spawn binary");
    assert!(!out.status.success(), "unknown keys must be rejected");
}
