use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::tempdir;

fn cli_bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_spacefold"))
}

fn run(root: &Path, extra: &[&str]) -> Output {
    Command::new(cli_bin_path())
        .arg("--root")
        .arg(root)
        .args(extra)
        .env_remove("SPACEFOLD_CACHE_VARIANT")
        .env_remove("SPACEFOLD_INCLUDE_HIDDEN")
        .output()
        .expect("run spacefold")
}

fn json_stdout(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is json")
}

fn seed_vault(root: &Path) {
    fs::create_dir_all(root.join("Projects")).expect("create projects");
    fs::write(root.join("readme.md"), "hi").expect("write readme");
    fs::write(root.join("Projects/plan.md"), "a longer plan").expect("write plan");
    fs::write(root.join("Projects/todo.txt"), "x").expect("write todo");
}

#[test]
fn uri_process_contract_prints_parsed_parts() {
    let root = tempdir().expect("tempdir");
    let output = run(root.path(), &["uri", "spaces://Projects/Q1#^abc"]);
    let parsed = json_stdout(&output);
    assert_eq!(parsed["scheme"], "spaces");
    assert_eq!(parsed["authority"], "Projects");
    assert_eq!(parsed["path"], "Q1");
    assert_eq!(parsed["ref"], "abc");
    assert_eq!(parsed["refType"], "context");
}

#[test]
fn scan_process_contract_reports_spaces_and_writes_cache() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path().join("vault");
    seed_vault(&root);
    let cache = dir.path().join("cache/spaces.db");
    let spaces = dir.path().join("spaces.json");
    fs::write(
        &spaces,
        r#"[{"path":"spaces://Text","type":"smart","filters":[{"type":"all","filters":[{"field":"extension","fn":"is","value":"txt","type":"fileprop"}]}]}]"#,
    )
    .expect("write spaces");

    let output = run(
        &root,
        &[
            "--cache",
            cache.to_str().expect("cache path"),
            "scan",
            "--spaces",
            spaces.to_str().expect("spaces path"),
        ],
    );
    let report = json_stdout(&output);
    assert_eq!(report["paths"], 4);
    assert_eq!(report["members"]["/"], 2);
    assert_eq!(report["members"]["Projects"], 2);
    assert_eq!(report["members"]["spaces://Text"], 1);
    assert!(cache.exists(), "cache file written on exit");

    let listed = json_stdout(&run(
        &root,
        &["--cache", cache.to_str().expect("cache path"), "cache", "list", "paths"],
    ));
    let rows = listed.as_array().expect("rows");
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| row["version"] == report["epoch"]));
}

#[test]
fn members_process_contract_orders_by_space_sort() {
    let dir = tempdir().expect("tempdir");
    seed_vault(dir.path());
    let spaces = dir.path().join(".spaces.json");
    fs::write(
        &spaces,
        r#"[{"path":"Projects","type":"folder","sort":{"field":"size","asc":false}}]"#,
    )
    .expect("write spaces");

    let output = run(
        dir.path(),
        &[
            "members",
            "Projects",
            "--spaces",
            spaces.to_str().expect("spaces path"),
        ],
    );
    let members = json_stdout(&output);
    let paths = members
        .as_array()
        .expect("members")
        .iter()
        .map(|member| member["path"].as_str().expect("path").to_string())
        .collect::<Vec<_>>();
    assert_eq!(paths, vec!["Projects/plan.md", "Projects/todo.txt"]);
    assert_eq!(members[0]["type"], "file");
}

#[test]
fn members_process_contract_fails_for_unknown_space() {
    let root = tempdir().expect("tempdir");
    let output = run(root.path(), &["members", "spaces://Nope"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown space"), "stderr: {stderr}");
    assert!(stderr.contains(r#""code":"NOT_FOUND""#), "stderr: {stderr}");
    assert!(stderr.contains(r#""operation":"members""#), "stderr: {stderr}");
}

#[test]
fn cache_clean_process_contract_sweeps_removed_paths() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path().join("vault");
    seed_vault(&root);
    let cache = dir.path().join("spaces.db");
    let cache_arg = cache.to_str().expect("cache path");

    json_stdout(&run(&root, &["--cache", cache_arg, "scan"]));
    let cleaned = json_stdout(&run(&root, &["--cache", cache_arg, "cache", "clean", "paths"]));
    assert_eq!(cleaned["kind"], "paths");
    assert_eq!(cleaned["swept"], 0);

    let bad_kind = run(&root, &["--cache", cache_arg, "cache", "list", "widgets"]);
    assert!(!bad_kind.status.success());
}

#[test]
fn cache_process_contract_requires_cache_flag() {
    let root = tempdir().expect("tempdir");
    let output = run(root.path(), &["cache", "list", "paths"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--cache"), "stderr: {stderr}");
}
