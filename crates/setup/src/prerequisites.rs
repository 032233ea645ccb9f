//! 32-bit shared libraries the XC installers need.
//!
//! The installers are 32-bit executables, so on a 64-bit Debian/Ubuntu host they only start once
//! the `i386` architecture is enabled and its C runtime and X11 libraries are installed.

use crate::error::SetupError;
use std::sync::Arc;
use xc_common::process::{Cmd, CommandRunner};

/// Packages that must be installed before running an installer, in the order they are checked.
pub const REQUIRED_PACKAGES: [&str; 5] =
    ["libc6:i386", "libx11-6:i386", "libxext6:i386", "libstdc++6:i386", "libexpat1:i386"];

/// Foreign architecture the required packages belong to.
pub const FOREIGN_ARCH: &str = "i386";

/// Program used to elevate the package manager commands by default.
pub const DEFAULT_SUDO: &str = "sudo";

/// Checks for and installs [`REQUIRED_PACKAGES`] with `dpkg` and `apt-get`.
#[derive(Clone, Debug)]
pub struct Prerequisites {
    runner: Arc<dyn CommandRunner>,
    packages: Vec<String>,
    sudo: Option<String>,
}

impl Prerequisites {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            packages: REQUIRED_PACKAGES.map(String::from).to_vec(),
            sudo: Some(DEFAULT_SUDO.to_string()),
        }
    }

    /// Sets the program the package manager commands run through, `None` to run them directly.
    pub fn with_sudo(mut self, sudo: Option<String>) -> Self {
        self.sudo = sudo;
        self
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// Returns whether `name` is installed according to `dpkg -l`.
    ///
    /// Never fails: a failing query, or one that cannot be run at all, means "not installed".
    pub async fn is_package_installed(&self, name: &str) -> bool {
        match self.runner.output(&Cmd::new("dpkg").args(["-l", name])).await {
            Ok(output) => output.success() && is_installed_in_listing(&output.stdout, name),
            Err(err) => {
                debug!(package = name, %err, "package query failed");
                false
            }
        }
    }

    /// Returns the required packages that are not installed, in list order.
    pub async fn missing_packages(&self) -> Vec<&str> {
        let mut missing = Vec::new();
        for package in &self.packages {
            if self.is_package_installed(package).await {
                debug!(package = package.as_str(), "installed");
            } else {
                missing.push(package.as_str());
            }
        }
        missing
    }

    /// Installs whichever required packages are missing.
    ///
    /// Nothing privileged runs when everything is already installed. Otherwise the foreign
    /// architecture is enabled, the package index refreshed and all missing packages installed
    /// in one `apt-get install`. Steps that already ran are not undone if a later one fails.
    pub async fn install(&self) -> Result<(), SetupError> {
        info!("checking prerequisites");
        let missing = self.missing_packages().await;
        if missing.is_empty() {
            info!("all prerequisites are installed");
            return Ok(());
        }

        info!("installing missing prerequisites: {}", missing.join(", "));
        let sudo = self.sudo.as_deref();
        let steps = [
            Cmd::new("dpkg").args(["--add-architecture", FOREIGN_ARCH]),
            Cmd::new("apt-get").args(["update", "-qq"]),
            Cmd::new("apt-get").args(["install", "-y", "-qq"]).args(&missing),
        ];
        for cmd in steps {
            self.runner
                .run(&cmd.elevated(sudo))
                .await
                .map_err(SetupError::PrerequisiteInstallFailed)?;
        }

        info!("prerequisites installed");
        Ok(())
    }
}

/// Looks for a `dpkg -l` row for `name` whose desired/status field is `ii`.
///
/// Only the first two columns are inspected, so `ii` showing up in a version or description does
/// not count. `dpkg` may print the name with or without its `:arch` qualifier.
fn is_installed_in_listing(listing: &str, name: &str) -> bool {
    let base = name.split(':').next().unwrap_or(name);
    listing.lines().any(|line| {
        let mut fields = line.split_whitespace();
        matches!(
            (fields.next(), fields.next()),
            (Some("ii"), Some(package)) if package == name || package == base
        )
    })
}
