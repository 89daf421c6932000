use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn demo_fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/st123.json")
}

fn utc_config(home: &TempDir) -> PathBuf {
    let path = home.path().join("config.toml");
    fs_err::write(&path, "[display]\nutc_offset_minutes = 0\n").expect("write config");
    path
}

fn run(home: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_shiptrack"))
        .env("HOME", home.path())
        .env_remove("SHIPTRACK_LOG_DIR")
        .env_remove("SHIPTRACK_DEBUG_LOG")
        .args(args)
        .output()
        .expect("Failed to run shiptrack")
}

fn json_lines(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("JSON output line"))
        .collect()
}

fn descriptions(line: &Value) -> Vec<String> {
    line["data"]["rows"]
        .as_array()
        .expect("history rows")
        .iter()
        .map(|row| row["description"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn replay_prints_reconciled_history_after_each_push() {
    let home = TempDir::new().expect("temp home");
    let config = utc_config(&home);
    let fixture = demo_fixture();
    let output = run(
        &home,
        &[
            "--json",
            "--config",
            config.to_str().expect("utf-8 path"),
            "replay",
            "--fixture",
            fixture.to_str().expect("utf-8 path"),
        ],
    );
    assert!(output.status.success(), "replay failed: {:?}", output);

    let histories: Vec<Value> = json_lines(&output)
        .into_iter()
        .filter(|line| line["kind"] == "history")
        .collect();
    // Opening history, then one refresh per accepted push; the ST999 push is ignored.
    assert_eq!(histories.len(), 3);
    assert_eq!(descriptions(&histories[0]), vec!["Arrived", "Registered"]);
    assert_eq!(
        descriptions(&histories[1]),
        vec!["Out for delivery", "In Transit", "Arrived", "Registered"]
    );
    assert_eq!(
        descriptions(&histories[2]),
        vec!["Delivered to front desk", "In Transit", "Arrived", "Registered"]
    );
}

#[test]
fn unknown_tracking_number_exits_with_error() {
    let home = TempDir::new().expect("temp home");
    let fixture = demo_fixture();
    let output = run(
        &home,
        &["lookup", "ST404", "--fixture", fixture.to_str().expect("utf-8 path")],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn history_prints_text_table() {
    let home = TempDir::new().expect("temp home");
    let config = utc_config(&home);
    let fixture = demo_fixture();
    let output = run(
        &home,
        &[
            "history",
            "ST123",
            "--fixture",
            fixture.to_str().expect("utf-8 path"),
            "--config",
            config.to_str().expect("utf-8 path"),
        ],
    );
    assert!(output.status.success(), "history failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Tracking Number:    ST123"));
    assert!(stdout.contains("2026-02-01 09:00:00  Arrived"));
}
