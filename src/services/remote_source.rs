use crate::config::StorageConfig;
use crate::error::{Result, UploadError};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::io::SeekFrom;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

/// A downloaded file spooled to an anonymous temporary file, rewound and
/// ready to read. The file disappears once dropped.
pub struct DownloadedFile {
    pub file: File,
    pub len: u64,
}

#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Provider identifier (e.g., "google_drive")
    fn source_id(&self) -> &'static str;

    /// Download a file by its host-side identifier
    async fn download(&self, file_id: &str) -> Result<DownloadedFile>;
}

/// Public download links of a Google Drive style file host.
pub struct DriveSource {
    client: Client,
    config: Arc<StorageConfig>,
}

impl DriveSource {
    pub fn new(client: Client, config: Arc<StorageConfig>) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl RemoteSource for DriveSource {
    fn source_id(&self) -> &'static str {
        "google_drive"
    }

    async fn download(&self, file_id: &str) -> Result<DownloadedFile> {
        let response = self
            .client
            .get(&self.config.remote_download_url)
            .query(&[("export", "download"), ("id", file_id)])
            .timeout(self.config.download_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UploadError::from_response(response).await);
        }

        let mut file = File::from_std(tempfile::tempfile()?);
        let mut len = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            len += chunk.len() as u64;
        }
        file.flush().await?;
        file.seek(SeekFrom::Start(0)).await?;

        Ok(DownloadedFile { file, len })
    }
}
