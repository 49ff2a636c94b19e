//! Runner tests drive plain system binaries through the interpreter
//! overrides, so they never need a Python or jac toolchain installed.

use std::io::Write;
use std::time::Duration;

use snip_host::runner::{Runner, RunnerConfig};

#[tokio::test]
async fn run_code_captures_stdout() {
    // `cat <file>` echoes the materialized snippet back.
    let runner = Runner::new(RunnerConfig {
        python_bin: "cat".into(),
        ..RunnerConfig::default()
    });

    let outcome = runner
        .run_code("print('hi')\n", "demo.py")
        .await
        .expect("run");
    assert_eq!(outcome.stdout, "print('hi')\n");
    assert_eq!(outcome.stderr, "");
    assert_eq!(outcome.exit_code, 0);
    assert!(!outcome.timed_out);
}

#[tokio::test]
async fn run_file_reports_nonzero_exit() {
    // `false` ignores its argument and exits 1.
    let runner = Runner::new(RunnerConfig {
        python_bin: "false".into(),
        ..RunnerConfig::default()
    });

    let mut file = tempfile::Builder::new()
        .suffix(".py")
        .tempfile()
        .expect("tempfile");
    file.write_all(b"whatever\n").expect("write");

    let outcome = runner.run_file(file.path()).await.expect("run");
    assert_eq!(outcome.exit_code, 1);
    assert!(!outcome.timed_out);
}

#[tokio::test]
async fn run_kills_child_on_timeout() {
    // With `sh` as the interpreter, the snippet body is a shell script.
    let runner = Runner::new(RunnerConfig {
        python_bin: "sh".into(),
        timeout: Duration::from_millis(300),
        ..RunnerConfig::default()
    });

    let outcome = runner.run_code("sleep 5\n", "wait.py").await.expect("run");
    assert!(outcome.timed_out);
    assert_eq!(outcome.exit_code, -1);
}

#[tokio::test]
async fn run_rejects_unknown_suffix() {
    let runner = Runner::new(RunnerConfig::default());
    let err = runner
        .run_code("x", "notes.txt")
        .await
        .expect_err("should reject");
    assert_eq!(err.code(), "unsupported_language");
}

#[tokio::test]
async fn run_missing_interpreter_is_spawn_failure() {
    let runner = Runner::new(RunnerConfig {
        python_bin: "definitely-not-an-interpreter".into(),
        ..RunnerConfig::default()
    });

    let err = runner
        .run_code("x", "demo.py")
        .await
        .expect_err("should fail to spawn");
    assert_eq!(err.code(), "spawn_failed");
}
