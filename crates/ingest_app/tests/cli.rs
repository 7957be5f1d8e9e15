use std::fs;
use std::process::Command;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn ingest(dir: &TempDir, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_ingest"))
        .current_dir(dir.path())
        .args(["--log", "off"])
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn folder_and_file_are_reported_as_json() {
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("project");
    fs::create_dir(&folder).unwrap();
    fs::write(folder.join("main.rs"), "fn main() {}\n").unwrap();
    fs::write(folder.join("blob.dat"), [0u8, 1, 0, 2]).unwrap();
    fs::write(dir.path().join("notes.txt"), "hello").unwrap();

    let output = ingest(&dir, &["--json", "notes.txt", "project"]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["kind"], "file");
    assert_eq!(lines[0]["title"], "notes.txt");
    assert_eq!(lines[0]["bytes"], 5);
    assert_eq!(lines[1]["kind"], "text_bundle");
    assert_eq!(lines[1]["title"], "project (1 file)");
    assert_eq!(lines[1]["skipped"][0]["path"], "blob.dat");
}

#[test]
fn label_flag_renames_bundles() {
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("src");
    fs::create_dir(&folder).unwrap();
    fs::write(folder.join("lib.rs"), "pub fn f() {}\n").unwrap();

    let output = ingest(&dir, &["--label", "my crate", "src"]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("text_bundle\tmy crate (1 file)"));
}

#[test]
fn unreadable_input_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let output = ingest(&dir, &["does-not-exist.txt"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("cannot read"));
}

#[test]
fn malformed_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("ingest.ron"), "(max_workers: nope)").unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();

    let output = ingest(&dir, &["a.txt"]);
    assert!(!output.status.success());
}
