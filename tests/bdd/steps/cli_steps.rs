#![allow(deprecated)]
use cucumber::{then, when};
use serde_json::Value;

use crate::RetreatWorld;

/// Run the `retreat` binary against the scenario database.
pub fn run_retreat(world: &mut RetreatWorld, args: &[String]) {
    // Without an initialized database, point at a file that does not exist.
    if world.db_path.is_none() {
        let dir = tempfile::TempDir::new().expect("create temp dir");
        world.db_path = Some(dir.path().join("missing.db"));
        world.db_dir = Some(dir);
    }
    let db_path = world.db_path.as_ref().expect("db_path set above");

    let output = assert_cmd::Command::cargo_bin("retreat")
        .expect("retreat binary not found")
        .env("RETREAT_DB", db_path)
        .env("RETREAT_LOG_LEVEL", "warn")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run retreat");

    world.last_stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    world.last_stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    world.last_exit_code = output.status.code().unwrap_or(-1);
}

/// Split a command line on whitespace, keeping 'single quoted' words together.
fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for ch in line.chars() {
        match ch {
            '\'' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
    args
}

#[when(regex = r"^I run `retreat (.*)`$")]
async fn i_run_retreat(world: &mut RetreatWorld, line: String) {
    let line = world.expand(&line);
    run_retreat(world, &split_args(&line));
}

#[then("the command succeeds")]
async fn the_command_succeeds(world: &mut RetreatWorld) {
    assert_eq!(
        world.last_exit_code, 0,
        "expected success, stderr was:\n{}",
        world.last_stderr
    );
}

#[then("the command fails")]
async fn the_command_fails(world: &mut RetreatWorld) {
    assert_ne!(
        world.last_exit_code, 0,
        "expected failure, stdout was:\n{}",
        world.last_stdout
    );
}

#[then(expr = "stdout contains {string}")]
async fn stdout_contains(world: &mut RetreatWorld, expected: String) {
    assert!(
        world.last_stdout.contains(&expected),
        "expected stdout to contain {expected:?}, but it was:\n{}",
        world.last_stdout
    );
}

#[then(expr = "stderr contains {string}")]
async fn stderr_contains(world: &mut RetreatWorld, expected: String) {
    assert!(
        world.last_stderr.contains(&expected),
        "expected stderr to contain {expected:?}, but it was:\n{}",
        world.last_stderr
    );
}

#[then(expr = "the JSON output is a list of {int} item(s)")]
async fn the_json_output_is_a_list(world: &mut RetreatWorld, expected: usize) {
    let json: Value = serde_json::from_str(&world.last_stdout)
        .unwrap_or_else(|e| panic!("stdout is not JSON: {e}\n{}", world.last_stdout));
    let items = json.as_array().expect("JSON output is not an array");
    assert_eq!(items.len(), expected, "got: {json}");
}

#[then(expr = "the JSON output at {string} is {string}")]
async fn the_json_output_at(world: &mut RetreatWorld, pointer: String, expected: String) {
    let json: Value = serde_json::from_str(&world.last_stdout)
        .unwrap_or_else(|e| panic!("stdout is not JSON: {e}\n{}", world.last_stdout));
    let actual = json
        .pointer(&pointer)
        .unwrap_or_else(|| panic!("no value at {pointer} in {json}"));
    assert_eq!(render(actual), expected, "at {pointer} in {json}");
}

/// Strings compare without quotes; everything else by its JSON text.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
