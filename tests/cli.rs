// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

const HOSTCALL_BIN: &str = env!("CARGO_BIN_EXE_hostcall");

/// Runs `hostcall` with `args` in `dir` and checks the exit status.
fn run_test<'a>(
    dir: &Path,
    args: &[&str],
    status: i32,
    input: impl Into<Option<&'a [u8]>>,
    expected_stdout: impl Into<Option<&'a [u8]>>,
) -> Output {
    let mut child = Command::new(HOSTCALL_BIN)
        .current_dir(dir)
        .env_remove("HOSTCALL_HOST")
        .env_remove("HOSTCALL_LOG")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("failed to run `{:?}`: {:#?}", args, e));

    if let Some(input) = input.into() {
        child
            .stdin
            .as_mut()
            .unwrap()
            .write_all(input)
            .expect("failed to write stdin to child");
    }
    drop(child.stdin.take());

    let output = child
        .wait_with_output()
        .unwrap_or_else(|e| panic!("failed to run `{:?}`: {:#?}", args, e));

    if let Some(expected_stdout) = expected_stdout.into() {
        assert_eq!(
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(expected_stdout)
        );
    }

    if output.status.code() != Some(status) {
        std::io::stderr()
            .write_all(output.stderr.as_slice())
            .unwrap();
        assert_eq!(output.status.code(), Some(status));
    }

    output
}

#[test]
fn file_write() {
    let dir = tempfile::tempdir().unwrap();
    run_test(
        dir.path(),
        &["run", "file_write"],
        0,
        None,
        &b"Run result: 0\nAll hostcalls: 4\n"[..],
    );
    let written = std::fs::read(dir.path().join("file_write_foo.txt")).unwrap();
    assert_eq!(written, b"Hello World!\n");
}

#[test]
fn file_write_replaces_existing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("file_write_foo.txt");
    std::fs::write(&path, "some much longer previous content\n").unwrap();

    run_test(dir.path(), &["run", "file_write"], 0, None, None);
    assert_eq!(std::fs::read(&path).unwrap(), b"Hello World!\n");
}

#[test]
fn file_write_failure_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("file_write_foo.txt");
    std::fs::create_dir(&path).unwrap();

    let output = run_test(dir.path(), &["-v", "run", "file_write"], 0, None, None);
    assert!(path.is_dir());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Run result: 0"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("file_write_foo.txt"));
}

#[test]
fn file_write_memory_host() {
    let dir = tempfile::tempdir().unwrap();
    run_test(
        dir.path(),
        &["run", "--host", "memory", "file_write"],
        0,
        None,
        &b"Run result: 0\nAll hostcalls: 4\n"[..],
    );
    assert!(!dir.path().join("file_write_foo.txt").exists());
}

#[test]
fn cat_stdin() {
    let dir = tempfile::tempdir().unwrap();
    run_test(
        dir.path(),
        &["run", "--read-file", "-", "cat"],
        0,
        &b"first\nsecond\n"[..],
        &b"first\nsecond\nRun result: 0\nAll hostcalls: 6\n"[..],
    );
}

#[test]
fn cat_without_input() {
    let dir = tempfile::tempdir().unwrap();
    run_test(
        dir.path(),
        &["run", "cat"],
        254,
        None,
        &b"cat: no input file\nRun result: 1\nAll hostcalls: 5\n"[..],
    );
}

#[test]
fn copy() {
    let dir = tempfile::tempdir().unwrap();
    let data: Vec<u8> = (0..20_000u32).map(|i| (i % 253) as u8).collect();
    std::fs::write(dir.path().join("src.bin"), &data).unwrap();

    run_test(dir.path(), &["run", "copy", "src.bin", "dst.bin"], 0, None, None);
    assert_eq!(std::fs::read(dir.path().join("dst.bin")).unwrap(), data);
}

#[test]
fn guest_fault() {
    let dir = tempfile::tempdir().unwrap();
    run_test(
        dir.path(),
        &["run", "--memory-size", "4096", "file_write"],
        254,
        None,
        &b"Run result: memory out of bound: 13 bytes at 0x1000\n"[..],
    );
}

#[test]
fn unknown_program() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_test(dir.path(), &["run", "nope"], 1, None, &b""[..]);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown program \"nope\""));
}

#[test]
fn unknown_host() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_test(dir.path(), &["run", "--host", "sgx", "file_write"], 1, None, None);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Host \"sgx\" is unsupported"));
    assert!(!dir.path().join("file_write_foo.txt").exists());
}

#[test]
fn list() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_test(dir.path(), &["list"], 0, None, None);
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["file_write", "timestamp", "random", "copy SRC DST", "cat"] {
        assert!(stdout.lines().any(|l| l.starts_with(name)), "{name}");
    }
}

#[test]
fn hosts() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_test(dir.path(), &["hosts", "--json"], 0, None, None);
    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<_> = info["hosts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["native", "memory"]);

    let output = run_test(dir.path(), &["hosts"], 0, None, None);
    assert!(String::from_utf8_lossy(&output.stdout).contains("✔ Host: native"));
}
