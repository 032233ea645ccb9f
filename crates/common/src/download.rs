//! Downloading installers over HTTP.

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use std::{fmt, path::PathBuf, time::Duration};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Fetches a URL into a local file.
#[async_trait]
pub trait Downloader: Send + Sync + fmt::Debug {
    /// Downloads `url` to a fresh temporary file and returns its path.
    async fn download(&self, url: &str) -> Result<PathBuf>;
}

/// [`Downloader`] backed by a [`reqwest::Client`].
#[derive(Clone, Debug)]
pub struct HttpDownloader {
    client: Client,
    dir: PathBuf,
}

impl HttpDownloader {
    /// Creates a downloader that stores files in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        // Installers are several hundred megabytes, so only the connection attempt is bounded.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .default_headers(HeaderMap::from_iter([
                (
                    USER_AGENT,
                    HeaderValue::from_static(concat!("setup-xc/", env!("CARGO_PKG_VERSION"))),
                ),
                (ACCEPT, HeaderValue::from_static("application/octet-stream")),
            ]))
            .build()
            .wrap_err("failed to create HTTP client")?;
        Ok(Self { client, dir: dir.into() })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .wrap_err_with(|| format!("could not create `{}`", self.dir.display()))?;
        let dest = self.dir.join(Uuid::new_v4().to_string());

        debug!(url, dest = %dest.display(), "downloading");
        let mut response = self.client.get(url).send().await?.error_for_status()?;

        let mut file = tokio::fs::File::create(&dest)
            .await
            .wrap_err_with(|| format!("could not create `{}`", dest.display()))?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(bytes = written, "download complete");
        Ok(dest)
    }
}
