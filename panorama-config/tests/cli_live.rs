use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

fn bin() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("panorama-config"))
}

#[test]
fn parent_dg_reports_missing_config_file() {
    bin()
        .args(["parent-dg", "--config"])
        .arg(fixture("fixtures/no-such-profile.toml"))
        .arg("Branches")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn stacks_for_template_requires_api_key() {
    bin()
        .env_remove("PANORAMA_API_KEY")
        .args(["stacks-for-template", "--config"])
        .arg(fixture("fixtures/panorama.toml"))
        .arg("Branch-Base")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no API key"));
}
