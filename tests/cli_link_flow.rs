#![cfg(unix)]

use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn link_list_unlink_via_the_binary() {
    let td = tempdir().unwrap();
    let root = fs::canonicalize(td.path()).unwrap();
    let registry = root.join("registry.json");
    let sync = root.join("sync");
    let target = root.join("app.conf");
    fs::write(&target, "from-cli").unwrap();

    let me = assert_cmd::cargo::cargo_bin!("synclink");

    let out = Command::new(&me)
        .arg("--registry")
        .arg(&registry)
        .arg("link")
        .arg(&target)
        .args(["-n", "cfg", "-s"])
        .arg(&sync)
        .output()
        .expect("spawn binary");
    eprintln!("=== STDOUT ===\n{}", String::from_utf8_lossy(&out.stdout));
    eprintln!("=== STDERR ===\n{}", String::from_utf8_lossy(&out.stderr));
    assert!(out.status.success(), "link should succeed");

    assert!(fs::symlink_metadata(&target).unwrap().file_type().is_symlink());
    assert_eq!(
        fs::read_to_string(sync.join("files/cfg")).unwrap(),
        "from-cli"
    );

    let out = Command::new(&me)
        .arg("--registry")
        .arg(&registry)
        .arg("list")
        .output()
        .expect("spawn binary");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("cfg"), "list should mention the link: {stdout}");
    assert!(stdout.contains("1 link(s) managed"), "got: {stdout}");

    let out = Command::new(&me)
        .arg("--registry")
        .arg(&registry)
        .args(["unlink", "cfg"])
        .output()
        .expect("spawn binary");
    assert!(out.status.success(), "unlink should succeed");

    assert!(fs::symlink_metadata(&target).unwrap().file_type().is_file());
    assert_eq!(fs::read_to_string(&target).unwrap(), "from-cli");
}

#[test]
fn shortcut_link_via_the_binary_uses_the_shortcut_dir() {
    let td = tempdir().unwrap();
    let root = fs::canonicalize(td.path()).unwrap();
    let registry = root.join("registry.json");
    let shortcut_dir = root.join("shortcuts");
    let target = root.join("tool.sh");
    fs::write(&target, "#!/bin/sh\n").unwrap();

    let me = assert_cmd::cargo::cargo_bin!("synclink");

    let out = Command::new(&me)
        .env("SYNCLINK_SHORTCUT_DIR", &shortcut_dir)
        .arg("--registry")
        .arg(&registry)
        .arg("link")
        .arg(&target)
        .args(["-n", "tool", "--shortcut"])
        .output()
        .expect("spawn binary");
    eprintln!("=== STDERR ===\n{}", String::from_utf8_lossy(&out.stderr));
    assert!(out.status.success(), "shortcut link should succeed");

    let artifact = shortcut_dir.join("tool.desktop");
    assert!(artifact.exists(), "desktop entry should be written");
    let content = fs::read_to_string(&artifact).unwrap();
    assert!(content.contains(&target.display().to_string()));

    // The target stays in place for the shortcut kind.
    assert!(fs::symlink_metadata(&target).unwrap().file_type().is_file());

    let out = Command::new(&me)
        .env("SYNCLINK_SHORTCUT_DIR", &shortcut_dir)
        .arg("--registry")
        .arg(&registry)
        .args(["unlink", "tool"])
        .output()
        .expect("spawn binary");
    assert!(out.status.success(), "shortcut unlink should succeed");
    assert!(!artifact.exists());
}

#[test]
fn bulk_relink_reports_a_tally() {
    let td = tempdir().unwrap();
    let root = fs::canonicalize(td.path()).unwrap();
    let registry = root.join("registry.json");
    let sync = root.join("sync");
    let me = assert_cmd::cargo::cargo_bin!("synclink");

    for i in 0..2 {
        let target = root.join(format!("f{i}.txt"));
        fs::write(&target, "x").unwrap();
        let out = Command::new(&me)
            .arg("--registry")
            .arg(&registry)
            .arg("link")
            .arg(&target)
            .args(["-n", &format!("f{i}"), "-s"])
            .arg(&sync)
            .output()
            .expect("spawn binary");
        assert!(out.status.success());
    }

    // Break one redirect, then reconcile everything.
    fs::remove_file(root.join("f0.txt")).unwrap();

    let out = Command::new(&me)
        .arg("--registry")
        .arg(&registry)
        .args(["relink", "*"])
        .output()
        .expect("spawn binary");
    assert!(out.status.success(), "bulk relink is not a fatal operation");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains("relink: 2 total, 2 succeeded, 0 failed"),
        "got: {stdout}"
    );
    assert!(fs::symlink_metadata(root.join("f0.txt"))
        .unwrap()
        .file_type()
        .is_symlink());
}
