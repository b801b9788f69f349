use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn uploader() -> Command {
    Command::cargo_bin("ragflow-uploader").expect("Binary exists")
}

#[test]
fn help_lists_the_upload_flags() {
    uploader()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--dataset_name")
                .and(predicate::str::contains("--batch_size"))
                .and(predicate::str::contains("--skip_existing"))
                .and(predicate::str::contains("--no_parse")),
        );
}

#[test]
fn help_says_non_interactive_never_prompts_for_target() {
    uploader()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "not even for dataset_name and directory",
        ));
}

#[test]
fn missing_api_key_fails_without_prompting() {
    let workdir = tempdir().unwrap();

    uploader()
        .current_dir(workdir.path())
        .args([
            "--non_interactive",
            "--base_url",
            "http://127.0.0.1:9",
            "--dataset_name",
            "kb",
            "--directory",
            ".",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--api_key"));
}

#[test]
fn zero_batch_size_is_rejected_by_the_parser() {
    uploader()
        .args(["--batch_size", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("batch_size"));
}

#[test]
fn settings_file_from_working_directory_is_used() {
    let workdir = tempdir().unwrap();
    fs::write(workdir.path().join(".env"), "BATCH_SIZE=not-a-number\n").unwrap();

    uploader()
        .current_dir(workdir.path())
        .args(["--non_interactive"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("BATCH_SIZE"));
}

#[test]
fn unreachable_server_exits_non_zero_and_writes_log() {
    let workdir = tempdir().unwrap();
    let docs = workdir.path().join("docs");
    fs::create_dir(&docs).unwrap();
    fs::write(docs.join("a.txt"), "hello").unwrap();
    let log = workdir.path().join("run.log");

    uploader()
        .current_dir(workdir.path())
        .args(["--non_interactive", "--api_key", "test-key-000000"])
        .args(["--base_url", "http://127.0.0.1:9"])
        .args(["--dataset_name", "kb"])
        .arg("--directory")
        .arg(&docs)
        .arg("--log_file")
        .arg(&log)
        .timeout(std::time::Duration::from_secs(60))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unavailable"));

    let logged = fs::read_to_string(&log).unwrap();
    assert!(logged.contains("Loaded configuration"));
    assert!(!logged.contains("test-key-000000"));
}
