//! Subprocess seam for `git`, `docker`, `ssh-keygen` and editors.
//!
//! Everything that shells out goes through [`ExternalTool`] so the domain
//! logic can be exercised with a scripted fake.

use crate::error::{KolynError, Result};
use std::path::Path;
use std::process::{Command, Stdio};

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code; `-1` when the process was killed by a signal.
    pub status: i32,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// stdout followed by stderr, for error reporting and classification.
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (true, true) => String::new(),
        }
    }
}

pub trait ExternalTool {
    /// Run to completion with captured output. A non-zero exit is not an error.
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<ToolOutput>;

    /// Run attached to the terminal. Returns the exit code.
    fn run_interactive(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<i32>;
}

/// The real thing: `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTool;

impl SystemTool {
    fn command(program: &str, args: &[&str], cwd: Option<&Path>) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

fn spawn_failed(program: &str, e: std::io::Error) -> KolynError {
    KolynError::ToolSpawnFailed {
        program: program.to_string(),
        reason: e.to_string(),
    }
}

impl ExternalTool for SystemTool {
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<ToolOutput> {
        tracing::debug!(program, ?args, cwd = ?cwd, "running");
        let output = Self::command(program, args, cwd)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_failed(program, e))?;

        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code().unwrap_or(-1),
        })
    }

    fn run_interactive(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<i32> {
        tracing::debug!(program, ?args, cwd = ?cwd, "running interactively");
        let status = Self::command(program, args, cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| spawn_failed(program, e))?;
        Ok(status.code().unwrap_or(-1))
    }
}

/// Turn a non-zero interactive exit into `ToolFailed`.
pub fn require_success(program: &str, status: i32) -> Result<()> {
    if status != 0 {
        return Err(KolynError::ToolFailed {
            program: program.to_string(),
            status,
        });
    }
    Ok(())
}

/// Where a child's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Attached to the terminal.
    #[default]
    Inherit,
    /// Captured, so stdout stays free for machine-readable output.
    Capture,
}

/// Run `program` in the given mode and fail on a non-zero exit. `label`
/// names the command in errors, e.g. `docker compose up`.
pub fn run_checked(
    tool: &dyn ExternalTool,
    mode: OutputMode,
    label: &str,
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
) -> Result<()> {
    match mode {
        OutputMode::Inherit => {
            let status = tool.run_interactive(program, args, cwd)?;
            require_success(label, status)
        }
        OutputMode::Capture => {
            let out = tool.run(program, args, cwd)?;
            if out.success() {
                tracing::debug!(label, output = %out.combined(), "command finished");
                return Ok(());
            }
            Err(KolynError::ToolOutputFailed {
                program: label.to_string(),
                status: out.status,
                output: out.combined(),
            })
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_output_joins_streams() {
        let out = ToolOutput {
            stdout: "out\n".into(),
            stderr: "err\n".into(),
            status: 1,
        };
        assert_eq!(out.combined(), "out\nerr");
        assert!(!out.success());
        assert_eq!(ToolOutput::default().combined(), "");
    }

    #[test]
    fn missing_program_is_spawn_failure() {
        let err = SystemTool
            .run("kolyn-definitely-not-a-real-binary", &[], None)
            .unwrap_err();
        assert!(matches!(err, KolynError::ToolSpawnFailed { .. }));
    }

    #[test]
    fn require_success_maps_status() {
        assert!(require_success("docker", 0).is_ok());
        assert!(matches!(
            require_success("docker", 2),
            Err(KolynError::ToolFailed { status: 2, .. })
        ));
    }

    #[test]
    fn scripted_tool_records_calls() {
        let tool = fake::ScriptedTool::new().respond("abc", 0);
        let out = tool.run("git", &["pull"], Some(Path::new("/tmp"))).unwrap();
        assert_eq!(out.stdout, "abc");
        assert_eq!(tool.lines(), vec!["git pull"]);
        assert_eq!(tool.run_interactive("vim", &["x"], None).unwrap(), 0);
        assert!(tool.calls.borrow()[1].interactive);
    }
}
