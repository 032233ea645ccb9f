//! Workflow commands understood by the GitHub Actions runner.
//!
//! Outputs and PATH additions are appended to the files the runner names in `GITHUB_OUTPUT` and
//! `GITHUB_PATH`; the deprecated stdout commands are used when those are not set, e.g. on older
//! self-hosted runners.

use std::{
    env,
    ffi::OsString,
    fmt, io,
    io::Write,
    path::{Path, PathBuf},
};
use uuid::Uuid;

/// The CI platform the setup step reports to.
pub trait ActionsHost: Send + Sync + fmt::Debug {
    /// Sets the named step output.
    fn set_output(&self, name: &str, value: &str) -> io::Result<()>;

    /// Prepends `dir` to `PATH` for this process and for all subsequent steps.
    fn add_path(&self, dir: &Path) -> io::Result<()>;

    /// Marks the step as failed with `message`.
    fn set_failed(&self, message: &str);
}

/// [`ActionsHost`] speaking the GitHub Actions file-command protocol.
#[derive(Clone, Debug, Default)]
pub struct GithubActions {
    output_file: Option<PathBuf>,
    path_file: Option<PathBuf>,
}

impl GithubActions {
    /// Reads the command files from the environment the runner sets up.
    pub fn from_env() -> Self {
        Self {
            output_file: non_empty_var("GITHUB_OUTPUT"),
            path_file: non_empty_var("GITHUB_PATH"),
        }
    }

    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    pub fn with_path_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.path_file = Some(path.into());
        self
    }
}

impl ActionsHost for GithubActions {
    fn set_output(&self, name: &str, value: &str) -> io::Result<()> {
        debug!(name, value, "setting output");
        match &self.output_file {
            Some(file) => append(file, &key_value_record(name, value)),
            None => {
                println!("::set-output name={name}::{}", escape_data(value));
                Ok(())
            }
        }
    }

    fn add_path(&self, dir: &Path) -> io::Result<()> {
        match &self.path_file {
            Some(file) => append(file, &format!("{}\n", dir.display()))?,
            None => println!("::add-path::{}", escape_data(&dir.display().to_string())),
        }

        let mut paths = vec![dir.to_path_buf()];
        if let Some(current) = env::var_os("PATH") {
            paths.extend(env::split_paths(&current));
        }
        let joined: OsString =
            env::join_paths(paths).map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        // SAFETY: the setup runs on a single thread of control, nothing else reads the
        // environment concurrently.
        unsafe {
            env::set_var("PATH", joined);
        }
        Ok(())
    }

    fn set_failed(&self, message: &str) {
        println!("::error::{}", escape_data(message));
    }
}

fn non_empty_var(key: &str) -> Option<PathBuf> {
    env::var_os(key).filter(|value| !value.is_empty()).map(PathBuf::from)
}

fn append(file: &Path, contents: &str) -> io::Result<()> {
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(file)?;
    file.write_all(contents.as_bytes())
}

/// Formats a multiline-safe `name<<delimiter` record for the `GITHUB_OUTPUT` file.
fn key_value_record(name: &str, value: &str) -> String {
    let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

/// Escapes the characters that would otherwise end or corrupt a workflow command.
pub fn escape_data(value: &str) -> String {
    value.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}
