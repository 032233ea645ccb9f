//! Installing a compiler, or reusing a cached one, and publishing it to the workflow.

use crate::{
    compiler::{Compiler, DEFAULT_DOWNLOAD_BASE_URL},
    error::SetupError,
    paths::{DEFAULT_INSTALL_DIR, bin_path, compiler_path},
    prerequisites::Prerequisites,
};
use eyre::WrapErr;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use xc_common::{
    actions::ActionsHost,
    cache::ToolCache,
    download::Downloader,
    process::{Cmd, CommandRunner},
};

/// Output holding the installation directory.
pub const OUTPUT_INSTALL_DIR: &str = "install-dir";

/// Output holding the directory with the compiler executables.
pub const OUTPUT_COMPILER_PATH: &str = "compiler-path";

/// What to set up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupInputs {
    /// Compiler identifier as given, validated when the setup runs.
    pub compiler: String,
    pub version: String,
    /// Root the compiler is installed under on a cache miss.
    pub install_dir: PathBuf,
}

impl SetupInputs {
    pub fn new(compiler: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            compiler: compiler.into(),
            version: version.into(),
            install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
        }
    }

    pub fn with_install_dir(mut self, install_dir: impl Into<PathBuf>) -> Self {
        self.install_dir = install_dir.into();
        self
    }
}

/// A compiler ready to use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Installation {
    pub compiler: Compiler,
    pub version: String,
    /// Installation root, the tool cache entry on a cache hit.
    pub install_dir: PathBuf,
    pub bin_dir: PathBuf,
    /// Whether the installation came from the tool cache.
    pub cached: bool,
}

impl Installation {
    fn new(compiler: Compiler, version: &str, install_dir: PathBuf, cached: bool) -> Self {
        let bin_dir = bin_path(&install_dir);
        Self { compiler, version: version.to_string(), install_dir, bin_dir, cached }
    }
}

/// Sets up XC compilers using the capabilities of the host it runs on.
#[derive(Debug)]
pub struct Setup {
    host: Arc<dyn ActionsHost>,
    cache: Arc<dyn ToolCache>,
    downloader: Arc<dyn Downloader>,
    runner: Arc<dyn CommandRunner>,
    prerequisites: Prerequisites,
    download_base_url: String,
}

impl Setup {
    pub fn new(
        host: Arc<dyn ActionsHost>,
        cache: Arc<dyn ToolCache>,
        downloader: Arc<dyn Downloader>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            host,
            cache,
            downloader,
            prerequisites: Prerequisites::new(runner.clone()),
            runner,
            download_base_url: DEFAULT_DOWNLOAD_BASE_URL.to_string(),
        }
    }

    /// Sets the URL the installers are downloaded from.
    pub fn with_download_base_url(mut self, url: impl Into<String>) -> Self {
        self.download_base_url = url.into();
        self
    }

    /// Sets the program prerequisites are installed through, `None` to run the package manager
    /// directly.
    pub fn with_sudo(mut self, sudo: Option<String>) -> Self {
        self.prerequisites = self.prerequisites.with_sudo(sudo);
        self
    }

    /// Makes the requested compiler available, installing it on a tool cache miss.
    ///
    /// On success the binary directory has been added to `PATH` and both outputs are set. Side
    /// effects of a failed run (enabled architectures, partially written installations) are left
    /// in place.
    pub async fn run(&self, inputs: &SetupInputs) -> Result<Installation, SetupError> {
        let compiler: Compiler = inputs.compiler.parse()?;
        let version = inputs.version.as_str();
        info!("setting up {compiler} {version}");

        if let Some(cached) = self.cache.find(compiler.as_str(), version).await {
            info!("found {compiler} {version} in the tool cache at {}", cached.display());
            let installation = Installation::new(compiler, version, cached, true);
            self.publish(&installation)?;
            return Ok(installation);
        }
        info!("{compiler} {version} is not cached, installing");

        self.prerequisites.install().await?;

        let url = compiler.installer_url(&self.download_base_url, version);
        info!("downloading {url}");
        let installer =
            self.downloader.download(&url).await.map_err(|err| SetupError::DownloadFailed {
                url: url.clone(),
                version: version.to_string(),
                source: err.into(),
            })?;

        let install_dir = compiler_path(&inputs.install_dir, compiler, version);
        self.execute_installer(&installer, &inputs.install_dir, &install_dir)
            .await
            .map_err(|err| SetupError::InstallationFailed(err.into()))?;

        let installation = Installation::new(compiler, version, install_dir, false);
        if !installation.bin_dir.exists() {
            return Err(SetupError::InstallationVerificationFailed(installation.bin_dir));
        }
        info!("installed {compiler} {version} to {}", installation.install_dir.display());

        let cached = self
            .cache
            .cache_dir(&installation.install_dir, compiler.as_str(), version)
            .await
            .map_err(|err| SetupError::Cache(err.into()))?;
        info!("cached {compiler} {version} at {}", cached.display());

        self.publish(&installation)?;
        Ok(installation)
    }

    /// Runs the downloaded installer unattended, installing into `prefix` under `base`.
    async fn execute_installer(
        &self,
        installer: &Path,
        base: &Path,
        prefix: &Path,
    ) -> eyre::Result<()> {
        make_executable(installer)
            .await
            .wrap_err_with(|| format!("could not make `{}` executable", installer.display()))?;
        // The installer creates `prefix` itself, only its parent has to exist.
        tokio::fs::create_dir_all(base)
            .await
            .wrap_err_with(|| format!("could not create `{}`", base.display()))?;

        let cmd = Cmd::new(installer)
            .args(["--mode", "unattended", "--netservername", "localhost", "--prefix"])
            .arg(prefix);
        info!("running installer");
        self.runner.run(&cmd).await?;
        Ok(())
    }

    fn publish(&self, installation: &Installation) -> Result<(), SetupError> {
        let bin_dir = &installation.bin_dir;
        self.host.add_path(bin_dir)?;
        self.host.set_output(OUTPUT_INSTALL_DIR, &installation.install_dir.to_string_lossy())?;
        self.host.set_output(OUTPUT_COMPILER_PATH, &bin_dir.to_string_lossy())?;
        info!("added {} to PATH", bin_dir.display());
        Ok(())
    }
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
