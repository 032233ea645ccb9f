use std::{error::Error, io, path::PathBuf};
use xc_common::process::CmdError;

/// A boxed underlying cause.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// The compiler identifier is not one of the supported ones.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unsupported compiler `{input}`, expected one of: {}", .supported.join(", "))]
pub struct UnsupportedCompiler {
    /// The identifier as it was given.
    pub input: String,
    pub supported: &'static [&'static str],
}

/// Why setting up a compiler failed.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Invalid compiler type: {input}. Must be one of: {}", .supported.join(", "))]
    InvalidCompiler { input: String, supported: &'static [&'static str] },
    #[error("Failed to install prerequisites: {0}")]
    PrerequisiteInstallFailed(#[source] CmdError),
    #[error(
        "Failed to download installer from {url}. Please verify that version {version} exists"
    )]
    DownloadFailed {
        url: String,
        version: String,
        #[source]
        source: BoxError,
    },
    #[error(
        "Installation failed. This may be due to insufficient permissions or the version not being available"
    )]
    InstallationFailed(#[source] BoxError),
    #[error("Installation verification failed: compiler binaries not found at {}", .0.display())]
    InstallationVerificationFailed(PathBuf),
    #[error("Failed to add the installation to the tool cache")]
    Cache(#[source] BoxError),
    #[error("Failed to publish the installation to the workflow")]
    Publish(#[from] io::Error),
}

impl From<UnsupportedCompiler> for SetupError {
    fn from(err: UnsupportedCompiler) -> Self {
        Self::InvalidCompiler { input: err.input, supported: err.supported }
    }
}
