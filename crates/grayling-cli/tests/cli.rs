use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

fn bin() -> Command {
    Command::new(assert_cmd::cargo_bin!("grayling-cli"))
}

fn write_graph(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().to_string()
}

fn run_with_stdin(mut cmd: Command, input: &str) -> std::process::Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn help_prints_usage_to_stdout_and_exits_zero() {
    let out = bin().arg("-?").output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("-Tv"));
}

#[test]
fn version_prints_to_stdout_and_exits_zero() {
    for flag in ["-V", "--version"] {
        let out = bin().arg(flag).output().unwrap();
        assert_eq!(out.status.code(), Some(0));
        assert!(String::from_utf8_lossy(&out.stdout).contains("grayling version"));
    }
}

#[test]
fn unrecognized_flags_print_usage_to_stderr_and_exit_one() {
    let out = bin().arg("-Z").output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("option -Z unrecognized"));
    assert!(stderr.contains("Usage:"));
    assert!(out.stdout.is_empty());
}

#[test]
fn unknown_engine_exits_two_without_reading_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_graph(dir.path(), "in.gv", "digraph g { }");
    let out = bin().args(["-Kbogus", input.as_str()]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("no layout engine support for \"bogus\""));
    assert!(stderr.contains("Use one of:"));
    assert!(out.stdout.is_empty());
}

#[test]
fn emits_one_json_document_per_graph() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_graph(
        dir.path(),
        "in.gv",
        "digraph demo { rankdir=LR label=\"hello\" size=\"5,3!\" }",
    );
    let out = bin().arg(&input).output().unwrap();
    assert_eq!(out.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);
    let doc: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(doc["engine"], "layered");
    assert_eq!(doc["index"], 0);
    assert!(doc["source"].as_str().unwrap().ends_with("in.gv"));
    assert_eq!(doc["config"]["rankdir"]["effective"], "left-to-right");
    assert_eq!(doc["config"]["size"]["hard_limit"], true);
    assert_eq!(doc["config"]["label"]["text"], "hello");
    assert_eq!(doc["graph"]["name"], "demo");
}

#[test]
fn unreadable_sources_are_skipped_but_fail_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_graph(dir.path(), "a.gv", "graph a { }");
    let missing = dir.path().join("missing.gv").to_string_lossy().to_string();
    let third = write_graph(dir.path(), "c.gv", "graph c { }");

    let out = bin().args([&first, &missing, &third]).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout.lines().count(), 2);
    assert!(String::from_utf8_lossy(&out.stderr).contains("can't open"));
}

#[test]
fn quiet_mode_suppresses_diagnostics_but_keeps_the_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.gv").to_string_lossy().to_string();
    let out = bin().args(["-q2", missing.as_str()]).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(!String::from_utf8_lossy(&out.stderr).contains("can't open"));
}

#[test]
fn reads_standard_input_when_no_files_are_given() {
    let out = run_with_stdin(bin(), "graph g { charset = big5 }\ndigraph h { }");
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["source"], "<stdin>");
    assert_eq!(first["config"]["charset"], "big5");
    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["index"], 1);
}

#[test]
fn plugin_inventory_is_emitted_once_with_internal_provenance() {
    let out = bin().arg("-P").output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);
    let doc: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(doc["source"], "<internal>");
    assert_eq!(doc["graph"]["name"], "plugins");
    assert!(
        doc["graph"]["attrs"]["label"]
            .as_str()
            .unwrap()
            .contains("layout: layered")
    );
}

#[test]
fn plain_device_emits_line_oriented_text() {
    let out = run_with_stdin(
        {
            let mut cmd = bin();
            cmd.arg("-Tplain");
            cmd
        },
        "digraph g { ranksep = \"0.8 equally\" }",
    );
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("graph g source=<stdin> index=0"));
    assert!(stdout.contains("charset UTF-8"));
    assert!(stdout.contains("ranksep 57.6 exact=true"));
    assert!(stdout.contains("end"));
}

#[test]
fn output_file_flag_writes_to_the_named_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_graph(dir.path(), "in.gv", "graph g { }");
    let target = dir.path().join("out.json").to_string_lossy().to_string();
    let out = bin()
        .args(["-o", target.as_str(), input.as_str()])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert!(out.stdout.is_empty());
    let written = fs::read_to_string(&target).unwrap();
    let doc: serde_json::Value = serde_json::from_str(written.trim()).unwrap();
    assert_eq!(doc["graph"]["name"], "g");
}

#[test]
fn auto_naming_appends_the_device_name_to_the_input_name() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_graph(dir.path(), "pair.gv", "graph a { } graph b { }");
    let out = bin().args(["-O", input.as_str()]).output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert!(out.stdout.is_empty());

    let first = fs::read_to_string(dir.path().join("pair.gv.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(first.trim()).unwrap();
    assert_eq!(doc["graph"]["name"], "a");
    let second = fs::read_to_string(dir.path().join("pair.gv.1.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(second.trim()).unwrap();
    assert_eq!(doc["graph"]["name"], "b");
}

#[test]
fn sandbox_toggle_aborts_without_usage_text() {
    let out = bin().env("GRAYLING_FILE_PATH", "/tmp").output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("no longer supported"));
    assert!(!stderr.contains("Usage:"));
}

#[test]
fn verbose_banner_goes_to_stderr_and_does_not_fail_the_run() {
    let out = run_with_stdin(
        {
            let mut cmd = bin();
            cmd.arg("-v");
            cmd
        },
        "graph g { }",
    );
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stderr).contains("grayling version"));
}
