use predicates::prelude::*;
use serde_json::Value;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_jsdoclet")));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn json_output(args: &[&str]) -> Value {
    let assert = cmd().args(args).assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    serde_json::from_str(&output).unwrap()
}

fn find<'a>(doclets: &'a Value, longname: &str) -> &'a Value {
    doclets
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["longname"] == longname)
        .unwrap_or_else(|| panic!("no doclet {longname}"))
}

fn longnames(doclets: &Value) -> Vec<String> {
    doclets
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["longname"].as_str().unwrap_or("").to_string())
        .collect()
}

// -- json --

#[test]
fn classes_with_inherited_and_borrowed_members() {
    let doclets = json_output(&[&fixture_path("shapes.js")]);
    let names = longnames(&doclets);
    for expected in [
        "Shape",
        "Shape#area",
        "Shape#describe",
        "Square",
        "Square#perimeter",
        "Square#area",
        "Square#describe",
        "shapes",
        "shapes.count",
        "geometry",
        "geometry.tally",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected} in {names:?}");
    }
    assert!(!names.iter().any(|n| n == "unused"));
    assert!(doclets.as_array().unwrap().iter().all(|d| d["undocumented"].is_null()));

    let shape = find(&doclets, "Shape");
    assert_eq!(shape["kind"], "class");
    assert_eq!(shape["params"][0]["name"], "name");
    assert_eq!(shape["params"][0]["type"][0], "string");

    let inherited = find(&doclets, "Square#describe");
    assert_eq!(inherited["inherited"], true);
    assert_eq!(inherited["inherits"], "Shape#describe");
    assert_eq!(inherited["memberof"], "Square");

    let count = find(&doclets, "shapes.count");
    assert_eq!(count["kind"], "function");
    assert_eq!(count["scope"], "static");
    assert_eq!(count["params"][0]["type"][0], "Array.<Shape>");

    let tally = find(&doclets, "geometry.tally");
    assert_eq!(tally["name"], "tally");
    assert_eq!(tally["memberof"], "geometry");
    assert_eq!(tally["scope"], "static");
    assert_eq!(tally["description"], "Count shapes.");
    assert!(find(&doclets, "geometry")["borrowed"].is_null());
}

#[test]
fn module_exports_and_inner_members() {
    let doclets = json_output(&[&fixture_path("strings.js")]);

    assert_eq!(find(&doclets, "module:strings")["kind"], "module");

    let trim = find(&doclets, "module:strings.trim");
    assert_eq!(trim["kind"], "function");
    assert_eq!(trim["scope"], "static");
    assert_eq!(trim["memberof"], "module:strings");
    assert_eq!(trim["params"][1]["name"], "limit");
    assert_eq!(trim["params"][1]["optional"], true);
    assert_eq!(trim["returns"][0]["type"][0], "string");
    assert_eq!(trim["meta"]["filename"], "strings.js");

    let padding = find(&doclets, "module:strings~PADDING");
    assert_eq!(padding["scope"], "inner");
    assert_eq!(padding["description"], "Padding character.");
}

#[test]
fn several_inputs_in_one_run() {
    let doclets = json_output(&[&fixture_path("shapes.js"), &fixture_path("strings.js")]);
    let names = longnames(&doclets);
    assert!(names.iter().any(|n| n == "Shape"));
    assert!(names.iter().any(|n| n == "module:strings.trim"));
}

#[test]
fn broken_file_is_skipped() {
    cmd()
        .arg(fixture_path("broken.js"))
        .arg(fixture_path("strings.js"))
        .assert()
        .success()
        .stdout(predicate::str::contains("module:strings.trim"))
        .stderr(predicate::str::contains("broken.js"));
}

#[test]
fn tree_output() {
    let tree = json_output(&["--tree", &fixture_path("shapes.js")]);
    assert_eq!(tree["global"]["Shape"]["kind"], "class");
    assert_eq!(tree["global"]["Shape"]["prototype"][".area"]["longname"], "Shape#area");
    assert_eq!(tree["global"]["shapes"][".count"]["longname"], "shapes.count");

    let tree = json_output(&["--tree", &fixture_path("strings.js")]);
    assert_eq!(tree["module"]["/strings"][".trim"]["kind"], "function");
}

// -- plugins --

#[test]
fn react_plugin_folds_props() {
    let doclets = json_output(&["--plugin", "react", &fixture_path("button.jsx")]);
    let button = find(&doclets, "Button");
    assert_eq!(button["kind"], "component");
    assert_eq!(button["props"][0]["name"], "label");
    assert_eq!(button["props"][0]["description"], "Text on the button.");
    assert!(!longnames(&doclets).iter().any(|n| n.starts_with("Button.propTypes")));
}

#[test]
fn markdown_pages_need_the_plugin() {
    let dir = TempDir::new().unwrap();
    std::fs::copy(fixture_path("intro.md"), dir.path().join("intro.md")).unwrap();
    std::fs::copy(fixture_path("strings.js"), dir.path().join("strings.js")).unwrap();
    let root = dir.path().to_str().unwrap();

    let doclets = json_output(&[root]);
    assert!(!longnames(&doclets).iter().any(|n| n == "intro"));

    let doclets = json_output(&["--plugin", "markdown", root]);
    let intro = find(&doclets, "intro");
    assert_eq!(intro["kind"], "namespace");
    assert_eq!(intro["description"], "Getting started.");
    assert!(intro["markdown"].as_str().unwrap().contains("# Introduction"));
    assert_eq!(intro["toc"][0]["text"], "Introduction");
}

#[test]
fn unknown_plugin_warns() {
    cmd()
        .args(["--plugin", "nope", &fixture_path("strings.js")])
        .assert()
        .success()
        .stderr(predicate::str::contains("nope"));
}

// -- markdown --

#[test]
fn markdown_to_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("docs/API.md");

    cmd()
        .args(["-f", "markdown", "-o", out.to_str().unwrap()])
        .arg(fixture_path("shapes.js"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let page = std::fs::read_to_string(&out).unwrap();
    assert!(page.starts_with("## Index"));
    assert!(page.contains("## Classes"));
    assert!(page.contains("### Shape\n"));
    assert!(page.contains("#### Shape#area"));
    assert!(page.contains("* `number`: The area."));
    assert!(page.contains("## Namespaces"));
}

#[test]
fn tree_requires_json() {
    cmd()
        .args(["--tree", "-f", "markdown", &fixture_path("shapes.js")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--tree"));
}

// -- config and errors --

#[test]
fn config_supplies_sources_and_plugins() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("jsdoclet.json");
    let body = serde_json::json!({
        "source": { "include": [fixture_path("button.jsx")] },
        "plugins": ["react"],
    });
    std::fs::write(&config, body.to_string()).unwrap();

    let doclets = json_output(&["-c", config.to_str().unwrap()]);
    assert_eq!(find(&doclets, "Button")["props"][0]["name"], "label");
}

#[test]
fn default_config_is_read_from_the_working_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::copy(fixture_path("strings.js"), dir.path().join("strings.js")).unwrap();
    std::fs::write(
        dir.path().join("jsdoclet.json"),
        r#"{ "source": { "include": ["strings.js"] } }"#,
    )
    .unwrap();

    let assert = cmd().current_dir(dir.path()).assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(output.contains("module:strings.trim"));
}

#[test]
fn missing_config_fails() {
    cmd()
        .args(["-c", "/definitely/not/here.json", &fixture_path("strings.js")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config"));
}

#[test]
fn no_inputs_fails() {
    let dir = TempDir::new().unwrap();
    cmd()
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input files"));
}

#[test]
fn unknown_format_fails() {
    cmd()
        .args(["-f", "html", &fixture_path("strings.js")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn strict_tags_report_unknown_tags() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("odd.js");
    std::fs::write(&file, "/**\n * Odd.\n * @frobnicate yes\n */\nfunction odd() {}\n").unwrap();
    let file = file.to_str().unwrap();

    cmd()
        .arg(file)
        .assert()
        .success()
        .stderr(predicate::str::contains("frobnicate").not());
    cmd()
        .args(["--strict-tags", file])
        .assert()
        .success()
        .stderr(predicate::str::contains("frobnicate"));
}
