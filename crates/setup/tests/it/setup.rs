use crate::fakes::{FakeCache, FakeDownloader, FakeHost, FakeRunner};
use setup_xc::{
    Compiler, Installation, Setup, SetupError, SetupInputs, compiler::DEFAULT_DOWNLOAD_BASE_URL,
    compiler_path,
};
use std::{path::PathBuf, sync::Arc};
use tempfile::TempDir;
use xc_common::errors::display_chain;

struct Harness {
    host: Arc<FakeHost>,
    cache: Arc<FakeCache>,
    downloader: Arc<FakeDownloader>,
    runner: Arc<FakeRunner>,
    dir: TempDir,
}

impl Harness {
    fn new(cache: FakeCache, runner: FakeRunner) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let downloader = FakeDownloader::new(dir.path());
        Self::with(cache, downloader, runner, dir)
    }

    fn with(
        cache: FakeCache,
        downloader: FakeDownloader,
        runner: FakeRunner,
        dir: TempDir,
    ) -> Self {
        Self {
            host: Arc::new(FakeHost::default()),
            cache: Arc::new(cache),
            downloader: Arc::new(downloader),
            runner: Arc::new(runner),
            dir,
        }
    }

    fn base(&self) -> PathBuf {
        self.dir.path().join("microchip")
    }

    fn inputs(&self, compiler: &str, version: &str) -> SetupInputs {
        SetupInputs::new(compiler, version).with_install_dir(self.base())
    }

    fn setup(&self) -> Setup {
        Setup::new(
            self.host.clone(),
            self.cache.clone(),
            self.downloader.clone(),
            self.runner.clone(),
        )
    }

    async fn run(&self, inputs: &SetupInputs) -> Result<Installation, SetupError> {
        self.setup().run(inputs).await
    }
}

/// The single-line message the step is marked failed with.
fn failure_message(err: SetupError) -> String {
    display_chain(&eyre::Report::from(err))
}

#[tokio::test]
async fn cache_hit_skips_installation() {
    let h = Harness::new(FakeCache::hit("/cached/xc16/v2.10"), FakeRunner::default());

    let installation = h.run(&h.inputs("xc16", "2.10")).await.unwrap();

    assert!(installation.cached);
    assert_eq!(installation.bin_dir, PathBuf::from("/cached/xc16/v2.10/bin"));
    assert_eq!(h.host.output("install-dir").as_deref(), Some("/cached/xc16/v2.10"));
    assert_eq!(h.host.output("compiler-path").as_deref(), Some("/cached/xc16/v2.10/bin"));
    assert_eq!(h.host.paths(), [PathBuf::from("/cached/xc16/v2.10/bin")]);

    assert_eq!(h.cache.lookups(), [("xc16".to_string(), "2.10".to_string())]);
    assert!(h.downloader.urls().is_empty());
    assert!(h.runner.queries().is_empty());
    assert!(h.runner.commands().is_empty());
    assert!(h.cache.stored().is_empty());
}

#[tokio::test]
async fn cache_miss_installs_and_caches() {
    let h = Harness::new(FakeCache::default(), FakeRunner::default());
    let install_dir = compiler_path(h.base(), Compiler::Xc8, "3.10");

    let installation = h.run(&h.inputs("xc8", "3.10")).await.unwrap();

    assert!(!installation.cached);
    assert_eq!(installation.install_dir, h.base().join("xc8").join("v3.10"));
    assert_eq!(installation.install_dir, install_dir);
    assert_eq!(installation.bin_dir, install_dir.join("bin"));

    assert_eq!(
        h.downloader.urls(),
        [format!("{DEFAULT_DOWNLOAD_BASE_URL}/xc8-v3.10-full-install-linux-x64-installer.run")]
    );
    let installer = h.dir.path().join("installer.run");
    assert_eq!(
        h.runner.commands(),
        [format!(
            "{} --mode unattended --netservername localhost --prefix {}",
            installer.display(),
            install_dir.display()
        )]
    );
    assert_eq!(h.runner.queries().len(), 5);

    assert_eq!(h.cache.stored(), [(install_dir.clone(), "xc8".to_string(), "3.10".to_string())]);
    let bin = install_dir.join("bin");
    assert_eq!(h.host.output("install-dir"), Some(install_dir.display().to_string()));
    assert_eq!(h.host.output("compiler-path"), Some(bin.display().to_string()));
    assert_eq!(h.host.paths(), [bin]);
}

#[tokio::test]
async fn compiler_identifier_is_case_insensitive() {
    let h = Harness::new(FakeCache::default(), FakeRunner::default());

    let installation = h.run(&h.inputs("XC32", "4.35")).await.unwrap();

    assert_eq!(installation.compiler, Compiler::Xc32);
    assert_eq!(installation.install_dir, h.base().join("xc32").join("v4.35"));
    assert_eq!(h.cache.lookups(), [("xc32".to_string(), "4.35".to_string())]);
}

#[tokio::test]
async fn installs_missing_prerequisites_before_downloading() {
    let runner = FakeRunner { packages_installed: false, ..Default::default() };
    let h = Harness::new(FakeCache::default(), runner);

    h.run(&h.inputs("xc16", "2.10")).await.unwrap();

    let commands = h.runner.commands();
    assert_eq!(commands.len(), 4);
    assert_eq!(commands[0], "sudo dpkg --add-architecture i386");
    assert_eq!(commands[1], "sudo apt-get update -qq");
    assert_eq!(
        commands[2],
        "sudo apt-get install -y -qq libc6:i386 libx11-6:i386 libxext6:i386 libstdc++6:i386 libexpat1:i386"
    );
    assert!(commands[3].contains("--mode unattended"));
    assert!(h.downloader.urls()[0].ends_with("xc16-v2.10-full-install-linux64-installer.run"));
}

#[tokio::test]
async fn invalid_compiler_fails_before_any_io() {
    let h = Harness::new(FakeCache::default(), FakeRunner::default());

    let err = h.run(&h.inputs("invalid", "1.0")).await.unwrap_err();

    assert!(matches!(err, SetupError::InvalidCompiler { .. }), "{err:?}");
    let message = failure_message(err);
    assert!(message.contains("Invalid compiler type"), "{message}");
    assert!(message.contains("invalid"), "{message}");
    assert!(message.contains("xc8, xc16, xc32"), "{message}");
    assert!(h.cache.lookups().is_empty());
    assert!(h.downloader.urls().is_empty());
    assert!(h.runner.queries().is_empty());
    assert!(h.host.paths().is_empty());
}

#[tokio::test]
async fn prerequisite_failure_aborts_before_download() {
    let runner = FakeRunner { packages_installed: false, apt_exit: 100, ..Default::default() };
    let h = Harness::new(FakeCache::default(), runner);

    let err = h.run(&h.inputs("xc8", "3.10")).await.unwrap_err();

    assert!(matches!(err, SetupError::PrerequisiteInstallFailed(_)), "{err:?}");
    assert!(failure_message(err).contains("exit code 100"));
    assert!(h.downloader.urls().is_empty());
}

#[tokio::test]
async fn download_failure_names_url_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let downloader = FakeDownloader::failing(dir.path());
    let h = Harness::with(FakeCache::default(), downloader, FakeRunner::default(), dir);

    let err = h.run(&h.inputs("xc8", "9.99")).await.unwrap_err();

    let url = format!("{DEFAULT_DOWNLOAD_BASE_URL}/xc8-v9.99-full-install-linux-x64-installer.run");
    let SetupError::DownloadFailed { url: failed_url, version, .. } = &err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(failed_url, &url);
    assert_eq!(version, "9.99");

    let message = failure_message(err);
    assert!(message.contains("Failed to download installer"), "{message}");
    assert!(message.contains(&url), "{message}");
    assert!(message.contains("version 9.99"), "{message}");
    assert!(h.runner.commands().is_empty());
}

#[tokio::test]
async fn installer_failure_is_reported() {
    let runner = FakeRunner { installer_exit: 1, ..Default::default() };
    let h = Harness::new(FakeCache::default(), runner);

    let err = h.run(&h.inputs("xc32", "4.35")).await.unwrap_err();

    assert!(matches!(err, SetupError::InstallationFailed(_)), "{err:?}");
    let message = failure_message(err);
    assert!(message.starts_with("Installation failed"), "{message}");
    assert!(message.contains("exit code 1"), "{message}");
    assert!(h.cache.stored().is_empty());
    assert!(h.host.paths().is_empty());
}

#[tokio::test]
async fn missing_bin_directory_fails_verification() {
    let runner = FakeRunner { creates_bin: false, ..Default::default() };
    let h = Harness::new(FakeCache::default(), runner);

    let err = h.run(&h.inputs("xc8", "3.10")).await.unwrap_err();

    let expected = compiler_path(h.base(), Compiler::Xc8, "3.10").join("bin");
    assert!(matches!(&err, SetupError::InstallationVerificationFailed(path) if *path == expected));
    let message = failure_message(err);
    assert!(message.contains("Installation verification failed"), "{message}");
    assert!(message.contains(&expected.display().to_string()), "{message}");
    assert!(h.cache.stored().is_empty());
}

#[tokio::test]
async fn creates_base_install_dir() {
    let runner = FakeRunner { creates_bin: false, ..Default::default() };
    let h = Harness::new(FakeCache::default(), runner);
    assert!(!h.base().exists());

    let _ = h.run(&h.inputs("xc8", "3.10")).await;

    assert!(h.base().is_dir());
    // The compiler directory itself is left to the installer.
    assert!(!h.base().join("xc8").exists());
}

#[tokio::test]
async fn cache_failure_surfaces() {
    let cache = FakeCache { fail: true, ..Default::default() };
    let h = Harness::new(cache, FakeRunner::default());

    let err = h.run(&h.inputs("xc16", "2.10")).await.unwrap_err();

    assert!(matches!(err, SetupError::Cache(_)), "{err:?}");
    assert!(failure_message(err).contains("no space left on device"));
    assert!(h.host.output("compiler-path").is_none());
}

#[tokio::test]
async fn uses_configured_download_base_url() {
    let h = Harness::new(FakeCache::default(), FakeRunner::default());
    let setup = h.setup().with_download_base_url("https://mirror.example/xc/");

    setup.run(&h.inputs("xc16", "2.10")).await.unwrap();

    assert_eq!(
        h.downloader.urls(),
        ["https://mirror.example/xc/xc16-v2.10-full-install-linux64-installer.run"]
    );
}

#[tokio::test]
async fn runs_package_manager_without_sudo() {
    let runner = FakeRunner { packages_installed: false, ..Default::default() };
    let h = Harness::new(FakeCache::default(), runner);
    let setup = h.setup().with_sudo(None);

    setup.run(&h.inputs("xc8", "3.10")).await.unwrap();

    assert_eq!(h.runner.commands()[0], "dpkg --add-architecture i386");
}
