//! # xc-common
//!
//! Capabilities of the host environment that `setup-xc` builds on: running commands, the CI
//! runner's tool cache, downloading files and talking to the workflow runner.
//!
//! Every capability is a trait with one real implementation, so the setup logic can be exercised
//! against in-memory doubles.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod actions;
pub mod cache;
pub mod download;
pub mod errors;
pub mod process;

pub use actions::{ActionsHost, GithubActions};
pub use cache::{RunnerToolCache, ToolCache};
pub use download::{Downloader, HttpDownloader};
pub use process::{Cmd, CmdOutput, CommandRunner, SystemRunner};
