use std::{fs, process::Command};

fn crawler() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_crypt-crawler"));
    let _ = command.env("RUST_LOG", "warn");
    command
}

#[test]
fn builtin_map_runs_and_reports() {
    let output = crawler()
        .args(["--seed", "3", "--ticks", "60"])
        .output()
        .expect("failed to launch crypt-crawler");

    assert!(output.status.success(), "headless run should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Welcome to Crypt Crawler."));
    assert!(stdout.contains("level: 20x11"));
    assert!(stdout.contains("after 60 ticks"));
}

#[test]
fn export_prints_interleaved_grid() {
    let output = crawler()
        .args(["--export"])
        .output()
        .expect("failed to launch crypt-crawler");

    assert!(output.status.success());
    let grid: Vec<i8> = serde_json::from_slice(&output.stdout).expect("grid json");
    assert_eq!(grid.len(), 20 * 11 * 2);
}

#[test]
fn malformed_level_file_fails() {
    let path = std::env::temp_dir().join(format!("crypt-crawler-bad-{}.json", std::process::id()));
    fs::write(&path, r#"{ "w": 4, "h": 4, "spacing": 5, "tiles": [1, 1] }"#).expect("write level");

    let output = crawler()
        .arg("--level")
        .arg(&path)
        .output()
        .expect("failed to launch crypt-crawler");
    let _ = fs::remove_file(&path);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed"));
}
