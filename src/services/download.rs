//! Attachment download over HTTP

use super::{Downloader, ServiceError};
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ServiceError::Download(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), ServiceError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ServiceError::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Download(format!("HTTP {}", response.status())));
        }

        let mut file = File::create(dest).await?;
        let mut written = 0usize;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ServiceError::Download(e.to_string()))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;

        debug!("Downloaded {} bytes to {:?}", written, dest);
        Ok(())
    }
}
