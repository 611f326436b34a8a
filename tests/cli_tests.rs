use std::io::Write;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tallybridge::testkit::fixtures;
use tempfile::{NamedTempFile, TempDir};

fn tallybridge() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tallybridge"));
    cmd.env_remove("TALLY_HOST")
        .env_remove("TALLY_PORT")
        .env_remove("RUST_LOG");
    cmd
}

fn write_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write");
    file
}

fn gateway_config(port: u16) -> NamedTempFile {
    write_file(&format!(
        "[connection]\nhost = \"127.0.0.1\"\nport = {port}\ntimeout_ms = 2000\nretry_count = 1\n\n[logging]\nlevel = \"error\"\n"
    ))
}

#[test]
fn help_lists_the_commands() {
    tallybridge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("discover"))
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("post"));
}

#[test]
fn check_config_prints_a_summary() {
    let file = write_file("[connection]\nhost = \"tally.local\"\nport = 9001\n");

    tallybridge()
        .args(["check", "config", "-c"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file is valid"))
        .stdout(predicate::str::contains("http://tally.local:9001/"));
}

#[test]
fn check_config_rejects_invalid_values() {
    let file = write_file("[connection]\nport = 0\n");

    tallybridge()
        .args(["check", "config", "-c"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("port"));
}

#[test]
fn check_config_requires_the_file() {
    let dir = TempDir::new().expect("temp dir");
    let missing = dir.path().join("missing.toml");

    tallybridge()
        .args(["check", "config", "-c"])
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn check_connection_fails_without_a_gateway() {
    let config = gateway_config(1);

    tallybridge()
        .args(["check", "connection", "-c"])
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot reach gateway"));
}

#[test]
fn fetch_rejects_unknown_data_types() {
    tallybridge()
        .args(["fetch", "trial_balance"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown data type 'trial_balance'"));
}

#[test]
fn fetch_rejects_malformed_params() {
    tallybridge()
        .args(["fetch", "ledger_details", "-p", "Cash"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected key=value"));
}

#[test]
fn fetch_prints_the_payload_as_json() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/")
        .with_body(fixtures::PROBE_OK)
        .create();
    server
        .mock("POST", "/")
        .with_header("content-type", "text/xml")
        .with_body(fixtures::COMPANY_INFO)
        .expect_at_least(1)
        .create();
    let config = gateway_config(server.socket_address().port());

    tallybridge()
        .args(["fetch", "company_info", "-c"])
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"data_type\": \"company_info\""))
        .stdout(predicate::str::contains("Acme Traders"));
}

fn voucher_file(xml: &str) -> NamedTempFile {
    write_file(xml)
}

fn post_validate_only(path: &Path) -> assert_cmd::assert::Assert {
    tallybridge()
        .args(["post", "--validate-only"])
        .arg(path)
        .assert()
}

#[test]
fn balanced_voucher_validates() {
    let file = voucher_file(fixtures::VOUCHER_BALANCED);

    post_validate_only(file.path())
        .success()
        .stdout(predicate::str::contains("Voucher is valid"));
}

#[test]
fn unbalanced_voucher_is_refused() {
    let file = voucher_file(fixtures::VOUCHER_UNBALANCED);

    post_validate_only(file.path())
        .failure()
        .stderr(predicate::str::contains("Voucher is not balanced"))
        .stderr(predicate::str::contains("1 validation issue"));
}

#[test]
fn post_imports_through_the_gateway() {
    let mut server = mockito::Server::new();
    let import = server
        .mock("POST", "/")
        .match_body(mockito::Matcher::Regex("Import Data".to_string()))
        .with_body(fixtures::IMPORT_CREATED)
        .create();
    let config = gateway_config(server.socket_address().port());
    let file = voucher_file(fixtures::VOUCHER_BALANCED);

    tallybridge()
        .arg("post")
        .arg(file.path())
        .arg("-c")
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"voucher_id\": \"4521\""));
    import.assert();
}

#[test]
fn shipped_example_config_is_valid() {
    let example = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml.example");

    tallybridge()
        .args(["check", "config", "-c"])
        .arg(&example)
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:9000/"));
}
