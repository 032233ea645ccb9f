//! Compiler identities and where their installers are published.

use crate::error::UnsupportedCompiler;
use std::{fmt, str::FromStr};

/// Where Microchip publishes the XC compiler installers.
pub const DEFAULT_DOWNLOAD_BASE_URL: &str =
    "https://ww1.microchip.com/downloads/aemDocuments/documents/DEV/ProductDocuments/SoftwareTools";

/// A supported Microchip XC compiler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Compiler {
    /// 8-bit PIC and AVR devices.
    Xc8,
    /// 16-bit PIC24 and dsPIC devices.
    Xc16,
    /// 32-bit PIC32 and SAM devices.
    Xc32,
}

impl Compiler {
    pub const ALL: [Self; 3] = [Self::Xc8, Self::Xc16, Self::Xc32];

    /// Canonical identifiers, in the same order as [`Self::ALL`].
    pub const NAMES: &'static [&'static str] = &["xc8", "xc16", "xc32"];

    /// Returns the canonical, lower-case identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Xc8 => "xc8",
            Self::Xc16 => "xc16",
            Self::Xc32 => "xc32",
        }
    }

    /// Returns the file name of the unattended Linux installer for `version`.
    pub fn installer_file_name(self, version: &str) -> String {
        match self {
            Self::Xc8 | Self::Xc32 => {
                format!("{self}-v{version}-full-install-linux-x64-installer.run")
            }
            // Published as `linux64`, without the `-x64` token the other two use.
            Self::Xc16 => format!("{self}-v{version}-full-install-linux64-installer.run"),
        }
    }

    /// Returns the URL of the installer for `version` under `base`.
    pub fn installer_url(self, base: &str, version: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.installer_file_name(version))
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compiler {
    type Err = UnsupportedCompiler;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xc8" => Ok(Self::Xc8),
            "xc16" => Ok(Self::Xc16),
            "xc32" => Ok(Self::Xc32),
            _ => Err(UnsupportedCompiler { input: s.to_string(), supported: Self::NAMES }),
        }
    }
}

/// Returns the installer URL for the compiler named `compiler` (case-insensitive) at `version`.
pub fn download_url(
    base: &str,
    compiler: &str,
    version: &str,
) -> Result<String, UnsupportedCompiler> {
    Ok(compiler.parse::<Compiler>()?.installer_url(base, version))
}
