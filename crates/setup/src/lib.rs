//! # setup-xc
//!
//! Installs Microchip XC compilers on CI runners.
//!
//! A run validates the requested compiler, reuses a tool cache entry when one exists, and otherwise
//! installs the 32-bit libraries the vendor installers need, downloads and runs the installer
//! unattended, verifies the result and caches it. Either way, the compiler's `bin` directory ends
//! up on the `PATH` of the following workflow steps.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod compiler;
pub mod error;
pub mod handler;
pub mod opts;
pub mod paths;
pub mod prerequisites;
pub mod setup;

pub use compiler::{Compiler, download_url};
pub use error::{SetupError, UnsupportedCompiler};
pub use paths::{bin_path, compiler_path};
pub use prerequisites::Prerequisites;
pub use setup::{Installation, Setup, SetupInputs};
