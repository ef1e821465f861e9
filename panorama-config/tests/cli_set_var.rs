use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

fn bin() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("panorama-config"))
}

fn device_var<'a>(stack: &'a Value, serial: &str, name: &str) -> Option<&'a Value> {
    stack["devices"]["entry"]
        .as_array()?
        .iter()
        .find(|d| d["@name"] == serial)?["variable"]["entry"]
        .as_array()?
        .iter()
        .find(|v| v["@name"] == name)
        .map(|v| &v["type"])
}

#[test]
fn set_var_updates_existing_device() {
    let dir = tempdir().expect("tempdir");
    let out = dir.path().join("out.json");

    bin()
        .args(["set-var", "--device", "013201001234", "--name", "$mgmt_ip", "--value", "10.10.0.9/24"])
        .arg(fixture("fixtures/branch-stack.json"))
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let stack: Value = serde_json::from_str(&fs::read_to_string(&out).expect("read")).expect("json");
    assert_eq!(
        device_var(&stack, "013201001234", "$mgmt_ip"),
        Some(&serde_json::json!({"ip-netmask": "10.10.0.9/24"}))
    );
    assert_eq!(stack["devices"]["entry"].as_array().map(Vec::len), Some(2));
}

#[test]
fn set_var_adds_missing_device_and_wraps_psk() {
    let output = bin()
        .args(["set-var", "--device", "013201009999", "--name", "$ike_psk", "--value", "hunter2"])
        .arg(fixture("fixtures/branch-stack.json"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stack: Value = serde_json::from_slice(&output).expect("json");
    assert_eq!(
        device_var(&stack, "013201009999", "$ike_psk"),
        Some(&serde_json::json!({"pre-shared-key": {"value": "hunter2"}}))
    );
}

#[test]
fn set_var_respects_no_create_device() {
    bin()
        .args(["set-var", "--device", "013201009999", "--name", "$hostname", "--value", "fw9"])
        .arg("--no-create-device")
        .arg(fixture("fixtures/branch-stack.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not in stack Branch-Stack"));
}

#[test]
fn set_var_rejects_undefined_variable() {
    bin()
        .args(["set-var", "--device", "013201001234", "--name", "$unknown", "--value", "x"])
        .arg(fixture("fixtures/branch-stack.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("variable definition \"$unknown\" not found"));
}

#[test]
fn set_var_refuses_to_overwrite_input() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("stack.json");
    fs::copy(fixture("fixtures/branch-stack.json"), &input).expect("copy");
    let before = fs::read_to_string(&input).expect("read");

    bin()
        .args(["set-var", "--device", "013201001234", "--name", "$hostname", "--value", "fw1"])
        .arg(&input)
        .arg("--output")
        .arg(dir.path().join(".").join("stack.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to overwrite"));

    assert_eq!(fs::read_to_string(&input).expect("read"), before);
}
