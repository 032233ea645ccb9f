//! Installation layout: `{base}/{compiler}/v{version}` with binaries under `bin`.

use crate::compiler::Compiler;
use std::path::{Component, Path, PathBuf};

/// Default root under which compilers are installed.
pub const DEFAULT_INSTALL_DIR: &str = "/opt/microchip";

/// Returns the directory `compiler` at `version` is installed into under `base`.
pub fn compiler_path(base: impl AsRef<Path>, compiler: Compiler, version: &str) -> PathBuf {
    normalize(&base.as_ref().join(compiler.as_str()).join(format!("v{version}")))
}

/// Returns the directory holding the compiler executables of an installation.
pub fn bin_path(install_dir: impl AsRef<Path>) -> PathBuf {
    install_dir.as_ref().join("bin")
}

/// Drops `.` components, including a leading one. `..` is kept as is.
fn normalize(path: &Path) -> PathBuf {
    let normalized: PathBuf =
        path.components().filter(|component| !matches!(component, Component::CurDir)).collect();
    if normalized.as_os_str().is_empty() { PathBuf::from(".") } else { normalized }
}
