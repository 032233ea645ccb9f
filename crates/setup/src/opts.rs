//! Command line and environment configuration.
//!
//! Every option can also be given through the environment, so the binary can run as a GitHub
//! Action step: the runner exposes the step inputs as `INPUT_<NAME>` variables.

use crate::{
    compiler::DEFAULT_DOWNLOAD_BASE_URL,
    paths::DEFAULT_INSTALL_DIR,
    prerequisites::DEFAULT_SUDO,
    setup::SetupInputs,
};
use clap::Parser;
use std::{convert::Infallible, path::PathBuf};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};
use url::Url;

/// Install a Microchip XC compiler and add it to the PATH of the following workflow steps.
#[derive(Clone, Debug, Parser)]
#[command(name = "setup-xc", version)]
pub struct SetupArgs {
    /// The compiler to install: xc8, xc16 or xc32.
    #[arg(long, env = "INPUT_COMPILER")]
    pub compiler: String,

    /// The compiler version to install, e.g. `3.10`.
    #[arg(
        long,
        env = "INPUT_VERSION",
        value_name = "VERSION",
        value_parser = clap::builder::NonEmptyStringValueParser::new()
    )]
    pub compiler_version: String,

    /// Directory compilers are installed under [default: /opt/microchip]
    #[arg(long, env = "INPUT_INSTALL-DIR", value_name = "DIR", value_parser = parse_path)]
    pub install_dir: Option<PathBuf>,

    /// Base URL the installers are downloaded from.
    #[arg(
        long,
        env = "XC_DOWNLOAD_BASE_URL",
        value_name = "URL",
        default_value = DEFAULT_DOWNLOAD_BASE_URL
    )]
    pub download_base_url: Url,

    /// Root of the tool cache.
    #[arg(long, env = "RUNNER_TOOL_CACHE", value_name = "DIR", value_parser = parse_path)]
    pub tool_cache: Option<PathBuf>,

    /// Directory installers are downloaded to.
    #[arg(long, env = "RUNNER_TEMP", value_name = "DIR", value_parser = parse_path)]
    pub temp_dir: Option<PathBuf>,

    /// Program used to run the package manager with elevated privileges.
    #[arg(long, env = "XC_SETUP_SUDO", value_name = "PROGRAM", default_value = DEFAULT_SUDO)]
    pub sudo: String,

    /// Run the package manager directly, e.g. in containers that already run as root.
    #[arg(long)]
    pub no_sudo: bool,

    #[command(flatten)]
    pub shell: ShellOptions,
}

impl SetupArgs {
    pub fn inputs(&self) -> SetupInputs {
        let inputs = SetupInputs::new(&self.compiler, &self.compiler_version);
        match non_empty(self.install_dir.as_ref()) {
            Some(dir) => inputs.with_install_dir(dir),
            None => inputs.with_install_dir(DEFAULT_INSTALL_DIR),
        }
    }

    pub fn tool_cache_dir(&self) -> PathBuf {
        non_empty(self.tool_cache.as_ref())
            .unwrap_or_else(|| std::env::temp_dir().join("setup-xc").join("tool-cache"))
    }

    pub fn download_dir(&self) -> PathBuf {
        non_empty(self.temp_dir.as_ref()).unwrap_or_else(std::env::temp_dir)
    }

    /// The privilege prefix for package manager commands, if any.
    pub fn sudo(&self) -> Option<String> {
        (!self.no_sudo && !self.sudo.is_empty()).then(|| self.sudo.clone())
    }
}

/// Accepts empty values, which the runner passes for inputs that were not given.
fn parse_path(s: &str) -> Result<PathBuf, Infallible> {
    Ok(PathBuf::from(s))
}

fn non_empty(path: Option<&PathBuf>) -> Option<PathBuf> {
    path.filter(|path| !path.as_os_str().is_empty()).cloned()
}

/// Global logging options.
#[derive(Clone, Copy, Debug, Default, Parser)]
pub struct ShellOptions {
    /// Use verbose output.
    #[arg(long, short, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print warnings and errors.
    #[arg(long, short, global = true, alias = "silent", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl ShellOptions {
    pub fn level(self) -> LevelFilter {
        match (self.verbose, self.quiet) {
            (true, _) => LevelFilter::DEBUG,
            (false, true) => LevelFilter::WARN,
            (false, false) => LevelFilter::INFO,
        }
    }

    /// Initializes a tracing subscriber for logging.
    ///
    /// `RUST_LOG` takes precedence over the verbosity flags. Timestamps are left out, the runner
    /// adds its own to every log line.
    pub fn subscriber(self) {
        let filter =
            EnvFilter::builder().with_default_directive(self.level().into()).from_env_lossy();
        tracing_subscriber::fmt().with_env_filter(filter).without_time().with_target(false).init();
    }
}
