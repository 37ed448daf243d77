//! End-to-end tests for the `inspect` command.
//!
//! Each test first creates a project with `zero create`, then inspects it,
//! so the build configuration is always rebuilt from the preset recorded in
//! the generated `package.json`.

#[allow(dead_code)]
mod common;
#[allow(unused_imports)]
use common::prelude::*;

fn web_project() -> TestFixture {
    let fixture = TestFixture::new().with_preset(presets::WEB_ESLINT);
    fixture.create("shop").success();
    fixture
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_inspect_full_config_is_annotated() {
    let fixture = web_project();

    fixture
        .command()
        .args(["inspect", "--dir", "shop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("// side: client"))
        .stdout(predicate::str::contains("/* config.module.rule('ts') */"))
        .stdout(predicate::str::contains("/* config.plugin('html') */"))
        .stdout(predicate::str::contains("new HtmlWebpackPlugin("));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_inspect_rule_names() {
    let fixture = web_project();

    let output = fixture
        .command()
        .args(["inspect", "--dir", "shop", "--rules"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let names: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(names, serde_json::json!(["ts", "style", "images"]));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_inspect_plugins_per_side() {
    let fixture = web_project();

    fixture
        .command()
        .args(["inspect", "--dir", "shop", "--plugins"])
        .assert()
        .success()
        .stdout(predicate::str::contains("style-lint-plugin"))
        .stdout(predicate::str::contains("eslint"));

    fixture
        .command()
        .args(["inspect", "--dir", "shop", "--plugins", "--name", "server"])
        .assert()
        .success()
        .stdout(predicate::str::contains("eslint"))
        .stdout(predicate::str::contains("style-lint-plugin").not());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_inspect_single_rule() {
    let fixture = web_project();

    fixture
        .command()
        .args(["inspect", "--rule", "ts"])
        .current_dir(fixture.path().join("shop"))
        .assert()
        .success()
        .stdout(predicate::str::contains("babel-loader"));

    fixture
        .command()
        .args(["inspect", "--dir", "shop", "--rule", "missing"])
        .assert()
        .success()
        .stdout(predicate::str::diff("{}\n"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_inspect_paths() {
    let fixture = web_project();

    let output = fixture
        .command()
        .args(["inspect", "--dir", "shop", "target", "entry.main"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let selected: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        selected,
        serde_json::json!({ "target": "web", "entry.main": ["./src/index.tsx"] })
    );
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_inspect_unknown_side() {
    let fixture = web_project();

    fixture
        .command()
        .args(["inspect", "--dir", "shop", "--name", "clinet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown side: clinet"))
        .stderr(predicate::str::contains("Did you mean 'client'?"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_inspect_outside_project() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("inspect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No package.json found"));

    let fixture = TestFixture::new().with_file("package.json", r#"{"name": "other"}"#);
    fixture
        .command()
        .arg("inspect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("__zero_config__"));
}

#[test]
fn test_inspect_selectors_conflict() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["inspect", "--rules", "--plugins"])
        .assert()
        .code(2);
}
