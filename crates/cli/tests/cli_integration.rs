use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn greet(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_greet"));
    cmd.current_dir(dir)
        .env_remove("GREET_NAME")
        .env_remove("GREET_TIMES")
        .env("RUST_LOG", "off");
    cmd
}

fn run_ok(cmd: &mut Command) -> String {
    let out = cmd.output().expect("failed to run greet");
    assert!(
        out.status.success(),
        "greet failed:\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr),
    );
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn run_err(cmd: &mut Command) -> Output {
    let out = cmd.output().expect("failed to run greet");
    assert!(
        !out.status.success(),
        "greet unexpectedly succeeded:\nstdout:\n{}",
        String::from_utf8_lossy(&out.stdout),
    );
    out
}

#[test]
fn hello_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run_ok(greet(dir.path()).arg("hello")), "Hello, World!\n");
    assert_eq!(run_ok(greet(dir.path()).arg("h")), "Hello, World!\n");
}

#[test]
fn root_and_command_flags_combine() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = run_ok(greet(dir.path()).args([
        "--formal", "-n", "Ada", "-t", "x", "-t", "y", "hello", "--shout", "--times", "2",
    ]));
    assert_eq!(stdout, "GOOD DAY, ADA! [X, Y]\nGOOD DAY, ADA! [X, Y]\n");
}

#[test]
fn name_resolves_env_then_file_then_default() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("greet-name.txt"), "File").unwrap();

    let stdout = run_ok(greet(dir.path()).env("GREET_NAME", "Env").arg("goodbye"));
    assert_eq!(stdout, "Goodbye, Env!\n");

    let stdout = run_ok(greet(dir.path()).arg("g"));
    assert_eq!(stdout, "Goodbye, File!\n");

    let stdout = run_ok(greet(dir.path()).env("GREET_NAME", "Env").args(["--name", "Flag", "g"]));
    assert_eq!(stdout, "Goodbye, Flag!\n");
}

#[test]
fn bad_env_value_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_err(greet(dir.path()).env("GREET_TIMES", "twice").arg("hello"));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("could not parse \"twice\" as int value for flag times"),
        "unexpected stderr:\n{stderr}"
    );
}

#[test]
fn two_forms_of_one_flag_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_err(greet(dir.path()).args(["--name", "a", "-n", "b", "hello"]));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.starts_with("Cannot use two forms of the same flag: n name\n\nNAME:\n"),
        "unexpected stdout:\n{stdout}"
    );
}

#[test]
fn nested_items_accept_flags_after_positionals() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = run_ok(greet(dir.path()).args(["list", "items", "a", "b", "c", "--limit", "2"]));
    assert_eq!(stdout, "1. a\n2. b\n");

    let stdout = run_ok(greet(dir.path()).args(["-t", "x", "-t", "y", "list", "items"]));
    assert_eq!(stdout, "1. x\n2. y\n");
}

#[test]
fn interior_command_without_match_shows_its_help() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = run_ok(greet(dir.path()).args(["list", "nothing"]));
    assert!(stdout.starts_with("NAME:\n   greet list - list things\n"), "{stdout}");
    assert!(stdout.contains("items"));
}

#[test]
fn echo_skips_flag_parsing() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = run_ok(greet(dir.path()).args(["echo", "-n", "--flag", "x"]));
    assert_eq!(stdout, "-n --flag x\n");
}

#[test]
fn version_and_help() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run_ok(greet(dir.path()).arg("--version")), "greet version 1.0.0\n");

    let stdout = run_ok(greet(dir.path()).arg("--help"));
    assert!(stdout.contains("COMMANDS:"), "{stdout}");
    assert!(stdout.contains("hello, h"), "{stdout}");
    assert!(stdout.contains("--name value, -n value"), "{stdout}");
    assert!(!stdout.contains("generate-bash-completion"), "{stdout}");

    let stdout = run_ok(greet(dir.path()).args(["help", "hello"]));
    assert!(stdout.starts_with("NAME:\n   greet hello - say hello\n"), "{stdout}");
    assert!(stdout.contains("--times N"), "{stdout}");

    let stdout = run_ok(greet(dir.path()).args(["help", "missing"]));
    assert_eq!(stdout, "No help topic for 'missing'\n");
}

#[test]
fn completion_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = run_ok(greet(dir.path()).arg("--generate-bash-completion"));
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        ["hello", "h", "goodbye", "g", "list", "flags", "echo", "help", "h"]
    );

    let stdout = run_ok(greet(dir.path()).args(["list", "--generate-bash-completion"]));
    assert_eq!(stdout, "items\nhelp\nh\n");
}

#[test]
fn unknown_flag_prints_incorrect_usage() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_err(greet(dir.path()).arg("--bogus"));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stdout.starts_with("Incorrect Usage.\n\n"), "{stdout}");
    assert!(stderr.contains("flag provided but not defined: -bogus"), "{stderr}");
}

#[test]
fn flags_command_prints_json() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = run_ok(greet(dir.path()).arg("flags"));
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("flags output is JSON");
    let entries = json.as_array().expect("array of flags");
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[1]["names"], "--name value, -n value");
    assert_eq!(entries[1]["default-text"], "\"World\"");
    assert_eq!(entries[2]["placeholder"], "TAG");
}
