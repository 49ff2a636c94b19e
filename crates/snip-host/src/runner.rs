//! Execution collaborator: spawns an interpreter against a snippet file and
//! captures its standard streams.
//!
//! Interpreters are invoked as an argv vector, never through a shell.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use snip_core::policy;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("unsupported language for '{filename}' (expected .py or .jac)")]
    UnsupportedLanguage { filename: String },
    #[error("failed to materialize snippet: {0}")]
    Materialize(std::io::Error),
    #[error("failed to spawn interpreter: {0}")]
    Spawn(std::io::Error),
    #[error("failed to wait for interpreter: {0}")]
    Wait(std::io::Error),
}

impl RunnerError {
    /// Stable machine-readable code for response envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            RunnerError::UnsupportedLanguage { .. } => "unsupported_language",
            RunnerError::Materialize(_) => "io_error",
            RunnerError::Spawn(_) => "spawn_failed",
            RunnerError::Wait(_) => "wait_failed",
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, RunnerError::UnsupportedLanguage { .. })
    }
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Interpreter for `.py` snippets, invoked as `<bin> <file>`.
    pub python_bin: String,
    /// Interpreter for `.jac` snippets, invoked as `<bin> run <file>`.
    pub jac_bin: String,
    /// Wall-clock limit for one run; the child is killed afterwards.
    pub timeout: Duration,
    /// Per-stream cap on captured output.
    pub max_output_bytes: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            python_bin: "python3".into(),
            jac_bin: "jac".into(),
            timeout: Duration::from_secs(30),
            max_output_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug)]
pub struct RunOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub timed_out: bool,
}

#[derive(Debug)]
pub struct Runner {
    cfg: RunnerConfig,
}

impl Runner {
    pub fn new(cfg: RunnerConfig) -> Self {
        Self { cfg }
    }

    /// Runs an existing snippet file through its interpreter.
    pub async fn run_file(&self, path: &Path) -> Result<RunOutcome, RunnerError> {
        let argv = self.argv_for(path)?;
        tracing::debug!(argv = ?argv, "running snippet");

        let mut command = Command::new(&argv[0]);
        command.args(&argv[1..]);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = command.spawn().map_err(RunnerError::Spawn)?;
        let Some(mut stdout) = child.stdout.take() else {
            return Err(RunnerError::Spawn(std::io::Error::other(
                "missing child stdout pipe",
            )));
        };
        let Some(mut stderr) = child.stderr.take() else {
            return Err(RunnerError::Spawn(std::io::Error::other(
                "missing child stderr pipe",
            )));
        };

        let stdout_task = tokio::spawn(async move {
            let mut out = Vec::new();
            let _ = stdout.read_to_end(&mut out).await;
            out
        });
        let stderr_task = tokio::spawn(async move {
            let mut out = Vec::new();
            let _ = stderr.read_to_end(&mut out).await;
            out
        });

        let (exit_code, timed_out) =
            match tokio::time::timeout(self.cfg.timeout, child.wait()).await {
                Ok(status) => {
                    let status = status.map_err(RunnerError::Wait)?;
                    (status.code().unwrap_or(-1), false)
                }
                Err(_) => {
                    let _ = child.kill().await;
                    let _ = child.wait().await;
                    (-1, true)
                }
            };

        let stdout_bytes = stdout_task.await.unwrap_or_default();
        let stderr_bytes = stderr_task.await.unwrap_or_default();

        Ok(RunOutcome {
            stdout: self.clip("stdout", stdout_bytes),
            stderr: self.clip("stderr", stderr_bytes),
            exit_code,
            timed_out,
        })
    }

    /// Materializes raw code as a temporary file (keeping the language
    /// suffix) and runs it. The file is removed when the run finishes.
    pub async fn run_code(&self, code: &str, filename: &str) -> Result<RunOutcome, RunnerError> {
        if !policy::is_allowed(filename) {
            return Err(RunnerError::UnsupportedLanguage {
                filename: filename.to_string(),
            });
        }
        let suffix = if filename.ends_with(".py") { ".py" } else { ".jac" };
        let tmp = tempfile::Builder::new()
            .prefix("snip-run-")
            .suffix(suffix)
            .tempfile()
            .map_err(RunnerError::Materialize)?;
        std::fs::write(tmp.path(), code).map_err(RunnerError::Materialize)?;
        self.run_file(tmp.path()).await
    }

    fn argv_for(&self, path: &Path) -> Result<Vec<String>, RunnerError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let file = path.to_string_lossy().to_string();
        if name.ends_with(".py") {
            Ok(vec![self.cfg.python_bin.clone(), file])
        } else if name.ends_with(".jac") {
            Ok(vec![self.cfg.jac_bin.clone(), "run".into(), file])
        } else {
            Err(RunnerError::UnsupportedLanguage { filename: name })
        }
    }

    fn clip(&self, stream: &str, mut bytes: Vec<u8>) -> String {
        if bytes.len() > self.cfg.max_output_bytes {
            tracing::warn!(
                stream,
                captured = bytes.len(),
                cap = self.cfg.max_output_bytes,
                "truncating run output"
            );
            bytes.truncate(self.cfg.max_output_bytes);
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
