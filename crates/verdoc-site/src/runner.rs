//! Synchronous execution of external collaborators (git, the doc build tool).

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::SiteError;

/// An external command: a program with a discrete argument vector.
///
/// Arguments are never joined into a shell string, so paths containing
/// spaces reach the program intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl Cmd {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Run the command from `dir` instead of the caller's working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Arguments as lossy UTF-8, handy for matching in scripted runners.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Executes commands on behalf of the site assembler.
pub trait CommandRunner {
    /// Run `cmd` to completion and return its stdout verbatim.
    ///
    /// A non-zero exit status is reported as [`SiteError::CommandFailed`]
    /// carrying the captured stderr.
    fn run(&self, cmd: &Cmd) -> Result<String, SiteError>;
}

/// Runs commands as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, cmd: &Cmd) -> Result<String, SiteError> {
        tracing::debug!("Running {}", cmd);

        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        if let Some(dir) = &cmd.current_dir {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|source| SiteError::Spawn {
            program: cmd.program.to_string_lossy().into_owned(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            return Err(SiteError::CommandFailed {
                command: cmd.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_program_and_args() {
        let cmd = Cmd::new("git").args(["worktree", "add"]).arg("my docs");

        assert_eq!(cmd.to_string(), "git worktree add my docs");
        assert_eq!(cmd.args_lossy(), ["worktree", "add", "my docs"]);
    }

    #[cfg(unix)]
    #[test]
    fn returns_stdout_verbatim() {
        let out = ProcessRunner
            .run(&Cmd::new("sh").args(["-c", "printf '  v1.0.0\\n\\n'"]))
            .unwrap();

        assert_eq!(out, "  v1.0.0\n\n");
    }

    #[cfg(unix)]
    #[test]
    fn keeps_arguments_with_spaces_intact() {
        let out = ProcessRunner
            .run(&Cmd::new("sh").args(["-c", "printf '%s' \"$1\"", "sh", "a path/with spaces"]))
            .unwrap();

        assert_eq!(out, "a path/with spaces");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_carries_stderr() {
        let err = ProcessRunner
            .run(&Cmd::new("sh").args(["-c", "echo out; echo boom >&2; exit 3"]))
            .unwrap_err();

        match err {
            SiteError::CommandFailed { stderr, command, .. } => {
                assert_eq!(stderr, "boom\n");
                assert!(command.starts_with("sh -c"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_current_dir() {
        let temp = tempfile::tempdir().unwrap();

        let out = ProcessRunner
            .run(&Cmd::new("pwd").current_dir(temp.path()))
            .unwrap();

        let reported = std::fs::canonicalize(out.trim_end()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(temp.path()).unwrap());
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let err = ProcessRunner
            .run(&Cmd::new("verdoc-definitely-not-a-program"))
            .unwrap_err();

        assert!(matches!(err, SiteError::Spawn { .. }));
    }
}
