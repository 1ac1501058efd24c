use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// Single target with --dry-run should print the dry-run message and exit 0.
#[test]
fn test_single_target_dry_run() {
    cargo_bin_cmd!("cyberscan")
        .args(&["http://example.com", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN] Would scan target: http://example.com"));
}

/// Dry run reports the normalized URL.
#[test]
fn test_dry_run_adds_scheme() {
    cargo_bin_cmd!("cyberscan")
        .args(&["example.com/login", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN] Would scan target: http://example.com/login"));
}

/// List file with --dry-run should process every non-blank line once.
#[test]
fn test_list_file_dry_run() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "http://target1.com").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "http://target2.com").unwrap();
    writeln!(file, "target3.com").unwrap();
    writeln!(file, "http://target1.com").unwrap();

    let path = file.path().to_str().unwrap().to_string();

    cargo_bin_cmd!("cyberscan")
        .args(&["-l", &path, "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN] Would scan target: http://target1.com"))
        .stdout(predicate::str::contains("[DRY RUN] Would scan target: http://target2.com"))
        .stdout(predicate::str::contains("[DRY RUN] Would scan target: http://target3.com"))
        .stdout(predicate::str::contains("Would scan target: http://target1.com").count(1));
}

/// A missing list file is reported and fails.
#[test]
fn test_missing_list_file_fails() {
    cargo_bin_cmd!("cyberscan")
        .args(&["-l", "/nonexistent/targets.txt", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

/// An unresolvable host prints the resolution message, writes no report and exits non-zero.
#[test]
fn test_unresolvable_host_fails() {
    let dir = tempfile::tempdir().unwrap();
    let reports = dir.path().join("reports");

    cargo_bin_cmd!("cyberscan")
        .args(&["http://no-such-host.invalid", "-p", "80", "-o", reports.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not resolve host 'no-such-host.invalid'"));

    assert!(!reports.exists());
}

/// Running with no arguments should fail (clap requires target or -l).
#[test]
fn test_no_args_shows_error() {
    cargo_bin_cmd!("cyberscan")
        .assert()
        .failure();
}

/// Non-numeric ports are rejected by the argument parser.
#[test]
fn test_invalid_port_list_rejected() {
    cargo_bin_cmd!("cyberscan")
        .args(&["http://example.com", "-p", "80,http", "--dry-run"])
        .assert()
        .failure();
}

/// A broken knowledge-base overlay aborts before any target is scanned.
#[test]
fn test_bad_knowledge_base_fails_early() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{{ not json").unwrap();
    let path = file.path().to_str().unwrap().to_string();

    cargo_bin_cmd!("cyberscan")
        .args(&["http://example.com", "--knowledge-base", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse knowledge base"))
        .stdout(predicate::str::contains("[+] Target:").not());
}
