//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bandcoach(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("bandcoach").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("OPENAI_API_KEY")
        .env("HOME", dir.path());
    cmd
}

#[test]
fn help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    bandcoach(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn config_defaults_without_file() {
    let dir = TempDir::new().unwrap();
    bandcoach(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("gpt-4o-mini"))
        .stdout(predicate::str::contains("whisper-1"))
        .stdout(predicate::str::contains("0.0.0.0:3000"))
        .stdout(predicate::str::contains("No credential configured"));
}

#[test]
fn config_masks_api_key() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(
        &path,
        "model = \"gpt-4o\"\n\n[openai]\napi_key = \"sk-very-secret\"\n",
    )
    .unwrap();

    bandcoach(&dir)
        .arg("config")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("gpt-4o"))
        .stdout(predicate::str::contains("***"))
        .stdout(predicate::str::contains("sk-very-secret").not())
        .stdout(predicate::str::contains("Credential configured"));
}

#[test]
fn config_picks_up_local_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("bandcoach.toml"),
        "bind = \"127.0.0.1:4000\"\n",
    )
    .unwrap();

    bandcoach(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("127.0.0.1:4000"));
}

#[test]
fn env_key_counts_as_credential() {
    let dir = TempDir::new().unwrap();
    bandcoach(&dir)
        .env("OPENAI_API_KEY", "sk-from-env")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Credential configured"))
        .stdout(predicate::str::contains("sk-from-env").not());
}

#[test]
fn missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    bandcoach(&dir)
        .arg("config")
        .arg("--config")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn serve_rejects_missing_config_file() {
    let dir = TempDir::new().unwrap();
    bandcoach(&dir)
        .arg("serve")
        .arg("--config")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn unknown_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    bandcoach(&dir).arg("frobnicate").assert().failure();
}
