use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::NamedTempFile;

// ============================================================================
// BASIC TRANSFER FLOW
// ============================================================================

#[test]
fn test_seed_and_transfer() {
    let mut cmd = Command::cargo_bin("ledger-engine").unwrap();
    let output = cmd
        .arg("tests/fixtures/basic.csv")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let output_str = String::from_utf8(output).unwrap();

    // Check header
    assert!(output_str.contains("account,balance"));

    // Account 1: seeded 100, sent 40 = 60
    assert!(output_str.contains("1,60.0000"));

    // Account 2: received 40
    assert!(output_str.contains("2,40.0000"));
}

#[test]
fn test_duplicate_key_applied_once() {
    let temp_file = NamedTempFile::new().unwrap();
    fs::write(
        temp_file.path(),
        "op,account,counterparty,amount,key,status\n\
         account,1,,,,\n\
         account,2,,,,\n\
         seed,1,,100.0,seed-1,\n\
         transfer,1,2,40.0,k1,\n\
         transfer,1,2,40.0,k1,\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("ledger-engine").unwrap();
    let output = cmd
        .arg(temp_file.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let output_str = String::from_utf8(output).unwrap();

    // The second line replays the first transfer, it does not double-debit
    assert!(output_str.contains("1,60.0000"));
    assert!(output_str.contains("2,40.0000"));
}

#[test]
fn test_insufficient_funds_leaves_balances() {
    let temp_file = NamedTempFile::new().unwrap();
    fs::write(
        temp_file.path(),
        "op,account,counterparty,amount,key,status\n\
         account,1,,,,\n\
         account,2,,,,\n\
         seed,1,,50.0,seed-1,\n\
         transfer,1,2,80.0,k1,\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("ledger-engine").unwrap();
    let output = cmd
        .arg(temp_file.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let output_str = String::from_utf8(output).unwrap();

    assert!(output_str.contains("1,50.0000"));
    assert!(output_str.contains("2,0.0000"));
}

#[test]
fn test_suspended_account_cannot_receive() {
    let mut cmd = Command::cargo_bin("ledger-engine").unwrap();
    let output = cmd
        .arg("tests/fixtures/statuses.csv")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let output_str = String::from_utf8(output).unwrap();

    // Transfer to the suspended account 3 was rejected
    assert!(output_str.contains("1,100.0000"));
    assert!(output_str.contains("3,0.0000"));
}

// ============================================================================
// INPUT VALIDATION
// ============================================================================

#[test]
fn test_missing_input_file() {
    let mut cmd = Command::cargo_bin("ledger-engine").unwrap();
    cmd.arg("nonexistent.csv").assert().failure();
}

#[test]
fn test_empty_file() {
    let temp_file = NamedTempFile::new().unwrap();
    fs::write(temp_file.path(), "op,account,counterparty,amount,key,status\n").unwrap();

    let mut cmd = Command::cargo_bin("ledger-engine").unwrap();
    cmd.arg(temp_file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("account,balance"));
}

#[test]
fn test_unknown_counterparty_ignored() {
    let temp_file = NamedTempFile::new().unwrap();
    fs::write(
        temp_file.path(),
        "op,account,counterparty,amount,key,status\n\
         account,1,,,,\n\
         seed,1,,100.0,seed-1,\n\
         transfer,1,9,10.0,k1,\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("ledger-engine").unwrap();
    let output = cmd
        .arg(temp_file.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let output_str = String::from_utf8(output).unwrap();

    // The transfer to the unknown account was rejected, funds stayed put
    assert!(output_str.contains("1,100.0000"));
}
