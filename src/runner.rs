//! Shell command execution
//!
//! Command templates resolve to a single command line, so everything runs
//! through the platform shell (`sh -c` or `cmd /C`).

use crate::error::{Result, WorkbenchError};
use crate::logging::Logger;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command_line` in `cwd` and capture its output
    async fn capture(&self, command_line: &str, cwd: &Path) -> Result<CommandOutput>;

    /// Run `command_line` in `cwd` attached to the terminal
    async fn run(&self, command_line: &str, cwd: &Path) -> Result<()>;

    /// Like [`capture`](Self::capture) but a non-zero exit is an error
    async fn capture_success(&self, command_line: &str, cwd: &Path) -> Result<String> {
        let output = self.capture(command_line, cwd).await?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(WorkbenchError::CommandFailed {
                command: command_line.to_string(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }
}

/// [`CommandRunner`] on top of `tokio::process`
#[derive(Debug, Clone)]
pub struct ShellRunner {
    logger: Logger,
    dry_run: bool,
}

impl ShellRunner {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            dry_run: false,
        }
    }

    /// Print terminal commands instead of running them; captures still run
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn shell(command_line: &str, cwd: &Path) -> Command {
        let mut command = if cfg!(windows) {
            let mut command = Command::new("cmd");
            command.arg("/C").arg(command_line);
            command
        } else {
            let mut command = Command::new("sh");
            command.arg("-c").arg(command_line);
            command
        };
        command.current_dir(cwd);
        command
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn capture(&self, command_line: &str, cwd: &Path) -> Result<CommandOutput> {
        tracing::debug!(command = command_line, cwd = %cwd.display(), "capturing command");
        let output = Self::shell(command_line, cwd)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| WorkbenchError::Io(format!("Failed to start `{}`: {}", command_line, e)))?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn run(&self, command_line: &str, cwd: &Path) -> Result<()> {
        self.logger.step(command_line);
        if self.dry_run {
            self.logger.info("Dry run mode - command not executed");
            return Ok(());
        }

        let status = Self::shell(command_line, cwd)
            .status()
            .await
            .map_err(|e| WorkbenchError::Io(format!("Failed to start `{}`: {}", command_line, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(WorkbenchError::CommandFailed {
                command: command_line.to_string(),
                code: status.code(),
                stderr: String::new(),
            })
        }
    }
}

/// Quote `arg` for the shell when it holds anything beyond a plain word
pub fn quote_arg(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@=+,".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("\"{}\"", arg.replace('"', "\\\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_arg() {
        assert_eq!(quote_arg("alpine:3.19"), "alpine:3.19");
        assert_eq!(quote_arg("registry.io/a/b@sha256:ab"), "registry.io/a/b@sha256:ab");
        assert_eq!(quote_arg("{{.Config.User}}"), "\"{{.Config.User}}\"");
        assert_eq!(quote_arg(""), "\"\"");
        assert_eq!(quote_arg("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_output_success() {
        let ok = CommandOutput {
            code: Some(0),
            ..Default::default()
        };
        assert!(ok.success());
        assert!(!CommandOutput::default().success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_runner_capture() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ShellRunner::new(Logger::new_quiet());

        let out = runner.capture_success("echo hello", dir.path()).await.unwrap();
        assert_eq!(out.trim(), "hello");

        let err = runner.capture_success("exit 3", dir.path()).await.unwrap_err();
        assert!(matches!(err, WorkbenchError::CommandFailed { code: Some(3), .. }));
    }

    #[tokio::test]
    async fn test_dry_run_skips_execution() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ShellRunner::new(Logger::new_quiet()).with_dry_run(true);
        assert!(runner.run("exit 1", dir.path()).await.is_ok());
    }
}
