//! Integration tests for apkolock CLI

use std::process::Command;
use tempfile::tempdir;

const IMAGE: &str = "contents:
  packages:
    - busybox
    - tzdata
archs:
  - x86_64
  - aarch64
";

fn resolutions(arm64_tzdata: &str) -> String {
    format!(
        r#"{{
  "x86_64": {{"packages": [
    {{"name": "busybox", "version": "1.36.1-r0"}},
    {{"name": "tzdata", "version": "2023c-r1"}}
  ]}},
  "aarch64": {{"packages": [
    {{"name": "busybox", "version": "1.36.1-r0"}},
    {{"name": "tzdata", "version": "{arm64_tzdata}"}}
  ]}}
}}"#
    )
}

fn apkolock() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_apkolock"));
    command.env_remove("RUST_LOG");
    for var in [
        "APKOLOCK_OUTPUT",
        "APKOLOCK_COLOR",
        "APKOLOCK_ARCHS",
        "APKOLOCK_EXTRA_PACKAGES",
        "APKOLOCK_OUT_DIR",
        "APKOLOCK_DISABLE_VERSION_TAGS",
    ] {
        command.env_remove(var);
    }
    command
}

#[test]
fn test_cli_version() {
    let output = apkolock()
        .arg("version")
        .output()
        .expect("Failed to execute apkolock");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_help() {
    let output = apkolock()
        .arg("--help")
        .output()
        .expect("Failed to execute apkolock");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("lock"));
    assert!(stdout.contains("tags"));
}

#[test]
fn test_cli_invalid_command() {
    let output = apkolock()
        .arg("invalid-command")
        .output()
        .expect("Failed to execute apkolock");

    assert!(!output.status.success());
}

#[test]
fn test_lock_json_output() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("image.yaml");
    let recorded = dir.path().join("resolutions.json");
    std::fs::write(&image, IMAGE).unwrap();
    std::fs::write(&recorded, resolutions("2023c-r1")).unwrap();

    let output = apkolock()
        .arg("--json")
        .arg("lock")
        .arg(&image)
        .arg("--resolutions")
        .arg(&recorded)
        .output()
        .expect("Failed to execute apkolock");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["type"], "LockReport");
    assert_eq!(
        json["data"]["index"]["contents"]["packages"],
        serde_json::json!(["busybox=1.36.1-r0", "tzdata=2023c-r1"])
    );
}

#[test]
fn test_lock_fails_on_inconsistent_versions() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("image.yaml");
    let recorded = dir.path().join("resolutions.json");
    std::fs::write(&image, IMAGE).unwrap();
    std::fs::write(&recorded, resolutions("2023c-r2")).unwrap();

    let output = apkolock()
        .args(["--color", "never", "lock"])
        .arg(&image)
        .arg("--resolutions")
        .arg(&recorded)
        .output()
        .expect("Failed to execute apkolock");

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Unable to lock package \"tzdata\" to a consistent version"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ops.lock_failed"));
}

#[test]
fn test_tags() {
    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked.yaml");
    std::fs::write(
        &locked,
        "contents:\n  packages:\n    - php-8.2=8.2.11-r1\n    - tzdata=2023c-r1\n",
    )
    .unwrap();

    let output = apkolock()
        .arg("tags")
        .arg(&locked)
        .arg("php")
        .output()
        .expect("Failed to execute apkolock");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let tags: Vec<&str> = stdout.lines().collect();
    assert_eq!(tags, vec!["8", "8.2", "8.2.11", "8.2.11-r1"]);
}

#[test]
fn test_streams_json_output() {
    let dir = tempdir().unwrap();
    let plan = dir.path().join("plan.yaml");
    let out = dir.path().join("out");
    std::fs::write(
        &plan,
        "versions:
  versions:
    php-8.2:
      version: '8.2'
      main: php-8.2
      is_latest: true
configs:
  php-8.2:
    component: cli
    config:
      contents:
        packages: [php-8.2]
    locked:
      contents:
        packages: [php-8.2=8.2.11-r1]
",
    )
    .unwrap();

    let output = apkolock()
        .arg("--json")
        .arg("streams")
        .arg(&plan)
        .arg("--out-dir")
        .arg(&out)
        .output()
        .expect("Failed to execute apkolock");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["type"], "Streams");
    let resolved = &json["data"]["resolved"]["php-8.2"];
    assert_eq!(resolved["version_stream_name"], "php-8.2");
    assert_eq!(resolved["is_latest"], true);
    assert_eq!(
        resolved["tags"],
        serde_json::json!(["8", "8.2", "8.2.11", "8.2.11-r1", "latest"])
    );
    assert!(out.join("php-8.2.php-8.2.resolved.yaml").exists());
    assert!(out.join("php-8.2.php-8.2.locked.yaml").exists());
}

