//! Running external programs.

use async_trait::async_trait;
use std::{
    ffi::{OsStr, OsString},
    fmt, io,
    process::Stdio,
};
use tokio::process::Command;

/// A program invocation: the program and its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
}

impl Cmd {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self { program: program.as_ref().to_os_string(), args: Vec::new() }
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
        self.args.extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    /// Runs this command through `prefix` (e.g. `sudo`), or unchanged if there is none.
    pub fn elevated(self, prefix: Option<&str>) -> Self {
        match prefix {
            Some(prefix) => Self::new(prefix).arg(self.program).args(self.args),
            None => self,
        }
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> impl Iterator<Item = &OsStr> {
        self.args.iter().map(OsString::as_os_str)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).stdin(Stdio::null());
        cmd
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

/// Captured result of a finished command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CmdOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CmdError {
    #[error("failed to execute `{cmd}`")]
    Spawn {
        cmd: String,
        #[source]
        source: io::Error,
    },
    #[error("`{cmd}` failed with {}", exit_description(*.code))]
    Failed { cmd: String, code: Option<i32> },
}

fn exit_description(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Executes commands on behalf of the setup steps.
#[async_trait]
pub trait CommandRunner: Send + Sync + fmt::Debug {
    /// Runs `cmd` to completion, capturing its output.
    async fn output(&self, cmd: &Cmd) -> io::Result<CmdOutput>;

    /// Runs `cmd` to completion with its output going straight to our own stdout/stderr, returning
    /// the exit code.
    async fn status(&self, cmd: &Cmd) -> io::Result<Option<i32>>;

    /// Runs `cmd` with inherited output and fails unless it exits successfully.
    async fn run(&self, cmd: &Cmd) -> Result<(), CmdError> {
        debug!(%cmd, "running");
        let code = self
            .status(cmd)
            .await
            .map_err(|source| CmdError::Spawn { cmd: cmd.to_string(), source })?;
        if code == Some(0) {
            return Ok(());
        }
        Err(CmdError::Failed { cmd: cmd.to_string(), code })
    }
}

/// Runs commands as child processes of this one.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn output(&self, cmd: &Cmd) -> io::Result<CmdOutput> {
        trace!(%cmd, "capturing output");
        let output = cmd.command().output().await?;
        Ok(CmdOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn status(&self, cmd: &Cmd) -> io::Result<Option<i32>> {
        let status =
            cmd.command().stdout(Stdio::inherit()).stderr(Stdio::inherit()).status().await?;
        Ok(status.code())
    }
}
