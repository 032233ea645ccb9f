//! The `setup-xc` CLI, usually run as a GitHub Actions step.

#[macro_use]
extern crate tracing;

use clap::Parser;
use eyre::Result;
use setup_xc::{Installation, Setup, handler, opts::SetupArgs};
use std::{process::ExitCode, sync::Arc};
use xc_common::{ActionsHost, GithubActions, HttpDownloader, RunnerToolCache, SystemRunner};

fn main() -> ExitCode {
    handler::install();
    let args = SetupArgs::parse();
    args.shell.subscriber();

    let host = Arc::new(GithubActions::from_env());
    match run(args, host.clone()) {
        Ok(installation) => {
            debug!(?installation, "setup complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            // The full report, with color-eyre's span trace when `XC_SETUP_DEBUG` is set.
            debug!("{err:?}");
            host.set_failed(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn run(args: SetupArgs, host: Arc<GithubActions>) -> Result<Installation> {
    let cache = RunnerToolCache::new(args.tool_cache_dir());
    let downloader = HttpDownloader::new(args.download_dir())?;
    let setup = Setup::new(host, Arc::new(cache), Arc::new(downloader), Arc::new(SystemRunner))
        .with_download_base_url(args.download_base_url.as_str())
        .with_sudo(args.sudo());

    Ok(setup.run(&args.inputs()).await?)
}
