use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use crate::error::RunError;

/// Default subprocess budget
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How to launch the evaluator as a child process.
#[derive(Debug, Clone)]
pub struct EvaluatorCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl EvaluatorCommand {
    /// Run the current executable's `evaluate` subcommand.
    pub fn current_exe(config_path: PathBuf, output_dir: PathBuf) -> std::io::Result<Self> {
        Ok(Self {
            program: std::env::current_exe()?,
            args: vec![
                "evaluate".to_string(),
                "--config".to_string(),
                config_path.display().to_string(),
                "--output-dir".to_string(),
                output_dir.display().to_string(),
            ],
            working_dir: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Parse a whitespace-separated command line, e.g. `"python3 evaluator.py"`.
    pub fn from_command_line(line: &str, timeout: Duration) -> Result<Self, RunError> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(RunError::EmptyCommand)?;
        Ok(Self {
            program: PathBuf::from(program),
            args: parts.collect(),
            working_dir: None,
            timeout,
        })
    }
}

/// Captured result of a finished evaluator process.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run the evaluator, killing it if it exceeds its timeout.
pub async fn run_evaluator(command: &EvaluatorCommand) -> Result<RunOutput, RunError> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &command.working_dir {
        cmd.current_dir(dir);
    }

    info!(program = %command.program.display(), args = ?command.args, "starting evaluator");
    let child = cmd.spawn().map_err(|source| RunError::Spawn {
        program: command.program.display().to_string(),
        source,
    })?;

    // Dropping the wait future on timeout drops the child, which kills it
    let output = match tokio::time::timeout(command.timeout, child.wait_with_output()).await {
        Ok(output) => output?,
        Err(_) => {
            warn!(timeout = ?command.timeout, "evaluator timed out");
            return Err(RunError::Timeout(command.timeout));
        }
    };

    let result = RunOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    info!(exit_code = ?result.exit_code, "evaluator finished");
    Ok(result)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, timeout: Duration) -> EvaluatorCommand {
        EvaluatorCommand {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), script.to_string()],
            working_dir: None,
            timeout,
        }
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let output = run_evaluator(&sh("echo scored", DEFAULT_TIMEOUT)).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "scored");
    }

    #[tokio::test]
    async fn test_non_zero_exit_keeps_output() {
        let output = run_evaluator(&sh("echo partial; echo boom >&2; exit 3", DEFAULT_TIMEOUT))
            .await
            .unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout.trim(), "partial");
        assert_eq!(output.stderr.trim(), "boom");
    }

    #[tokio::test]
    async fn test_timeout_is_distinct() {
        let err = run_evaluator(&sh("sleep 5", Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Timeout(d) if d == Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();

        let mut command = sh("cat marker.txt", DEFAULT_TIMEOUT);
        command.working_dir = Some(dir.path().to_path_buf());
        let output = run_evaluator(&command).await.unwrap();
        assert!(output.success(), "{}", output.stderr);
        assert_eq!(output.stdout, "here");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let command = EvaluatorCommand::from_command_line(
            "/definitely/not/a/real/evaluator --flag",
            DEFAULT_TIMEOUT,
        )
        .unwrap();
        assert_eq!(command.args, ["--flag"]);
        assert!(matches!(
            run_evaluator(&command).await,
            Err(RunError::Spawn { .. })
        ));
    }

    #[test]
    fn test_empty_command_line() {
        assert!(matches!(
            EvaluatorCommand::from_command_line("   ", DEFAULT_TIMEOUT),
            Err(RunError::EmptyCommand)
        ));
    }
}
