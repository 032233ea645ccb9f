//! The runner's tool cache.
//!
//! Entries live at `{root}/{name}/{version}/{arch}`; an entry only counts once the sibling
//! `{arch}.complete` marker exists, so an interrupted copy is never picked up as a hit.

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Directory store keyed by tool name and version.
#[async_trait]
pub trait ToolCache: Send + Sync + fmt::Debug {
    /// Returns the cached directory for `name` at `version`, if there is one.
    async fn find(&self, name: &str, version: &str) -> Option<PathBuf>;

    /// Copies `source` into the cache under `name` and `version`, returning the cached path.
    async fn cache_dir(&self, source: &Path, name: &str, version: &str) -> Result<PathBuf>;
}

/// [`ToolCache`] using the same directory layout as the hosted runners' `RUNNER_TOOL_CACHE`.
#[derive(Clone, Debug)]
pub struct RunnerToolCache {
    root: PathBuf,
    arch: String,
}

impl RunnerToolCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), arch: host_arch().to_string() }
    }

    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry(&self, name: &str, version: &str) -> PathBuf {
        self.root.join(name).join(version).join(&self.arch)
    }

    fn marker(&self, name: &str, version: &str) -> PathBuf {
        self.root.join(name).join(version).join(format!("{}.complete", self.arch))
    }
}

#[async_trait]
impl ToolCache for RunnerToolCache {
    async fn find(&self, name: &str, version: &str) -> Option<PathBuf> {
        let entry = self.entry(name, version);
        if !entry.is_dir() {
            trace!(path = %entry.display(), "no cache entry");
            return None;
        }
        if !self.marker(name, version).is_file() {
            warn!(path = %entry.display(), "ignoring incomplete cache entry");
            return None;
        }
        Some(entry)
    }

    async fn cache_dir(&self, source: &Path, name: &str, version: &str) -> Result<PathBuf> {
        eyre::ensure!(source.is_dir(), "cache source `{}` is not a directory", source.display());

        let entry = self.entry(name, version);
        let marker = self.marker(name, version);
        let (source, dest) = (source.to_path_buf(), entry.clone());
        tokio::task::spawn_blocking(move || -> Result<()> {
            if marker.exists() {
                fs::remove_file(&marker)?;
            }
            if dest.exists() {
                fs::remove_dir_all(&dest)
                    .wrap_err_with(|| format!("could not remove `{}`", dest.display()))?;
            }
            copy_dir(&source, &dest)?;
            fs::write(&marker, "")
                .wrap_err_with(|| format!("could not write `{}`", marker.display()))?;
            Ok(())
        })
        .await??;

        Ok(entry)
    }
}

/// Maps the Rust target architecture to the names the runner uses.
pub fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x64",
        "x86" => "x86",
        "aarch64" => "arm64",
        "arm" => "arm",
        other => other,
    }
}

/// Recursively copies `src` into `dest`, recreating symlinks instead of following them.
fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .wrap_err_with(|| format!("could not create `{}`", target.display()))?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path())?;
            symlink(&link, &target)
                .wrap_err_with(|| format!("could not link `{}`", target.display()))?;
        } else {
            fs::copy(entry.path(), &target).wrap_err_with(|| {
                format!("could not copy `{}` to `{}`", entry.path().display(), target.display())
            })?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(not(unix))]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    fs::copy(original, link).map(drop)
}
