//! Chunked uploads over the storage API's resumable (tus) endpoint.
//!
//! A session is opened with the total length, then the bytes are sent as
//! contiguous `PATCH` requests. Every file gets a fresh session; a failed
//! chunk fails the file.

use crate::config::StorageConfig;
use crate::error::{Result, UploadError, truncate_body};
use crate::infrastructure::http::ServiceKeyAuth;
use crate::utils::format::{megabytes, percent};
use crate::utils::validation::content_type_for;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};
use url::Url;

pub const TUS_VERSION: &str = "1.0.0";
const OFFSET_OCTET_STREAM: &str = "application/offset+octet-stream";

/// Byte range of one chunk within the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub offset: u64,
    pub len: usize,
}

/// Splits `total` bytes into contiguous spans of at most `chunk_size`.
pub fn chunk_spans(total: u64, chunk_size: usize) -> impl Iterator<Item = ChunkSpan> {
    let step = chunk_size.max(1) as u64;
    (0..total).step_by(step as usize).map(move |offset| ChunkSpan {
        offset,
        len: step.min(total - offset) as usize,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Uploading { offset: u64 },
    Complete,
    Failed,
}

pub struct ResumableUploader {
    client: Client,
    config: Arc<StorageConfig>,
}

impl ResumableUploader {
    pub fn new(client: Client, config: Arc<StorageConfig>) -> Self {
        Self { client, config }
    }

    pub fn chunk_size(&self) -> usize {
        self.config.resumable_chunk_size
    }

    /// Uploads a local file chunk by chunk, reading it from disk as it goes.
    pub async fn upload_file(&self, key: &str, path: &Path) -> Result<String> {
        let file = tokio::fs::File::open(path).await?;
        let total_len = file.metadata().await?.len();
        self.upload(key, file, total_len).await
    }

    /// Uploads `total_len` bytes read from `reader` and returns the storage key.
    pub async fn upload<R>(&self, key: &str, reader: R, total_len: u64) -> Result<String>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut session = self.open_session(key, total_len).await?;
        session.send_from(reader).await
    }

    /// Creates a new upload session for `key`.
    ///
    /// # Errors
    /// `SessionCreate` unless the server answers 200/201 with a `Location`.
    pub async fn open_session(&self, key: &str, total_len: u64) -> Result<ResumableSession<'_>> {
        let endpoint = self.config.resumable_url();
        let response = self
            .client
            .post(&endpoint)
            .service_key(&self.config.service_key)
            .header("Tus-Resumable", TUS_VERSION)
            .header("Upload-Length", total_len)
            .header("Upload-Metadata", self.upload_metadata(key))
            .header(CONTENT_TYPE, OFFSET_OCTET_STREAM)
            .timeout(self.config.upload_timeout)
            .send()
            .await
            .map_err(|e| UploadError::SessionCreate(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::SessionCreate(format!(
                "{} - {}",
                status,
                truncate_body(&body)
            )));
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| UploadError::SessionCreate("response has no Location header".to_string()))?;
        let location = Url::parse(&endpoint)
            .and_then(|base| base.join(location))
            .map_err(|e| UploadError::SessionCreate(format!("invalid Location {}: {}", location, e)))?;

        debug!("Opened resumable session for {} at {}", key, location);

        Ok(ResumableSession {
            uploader: self,
            key: key.to_string(),
            location,
            total_len,
            offset: 0,
            state: SessionState::Created,
        })
    }

    fn upload_metadata(&self, key: &str) -> String {
        format!(
            "bucketName {},objectName {},contentType {}",
            STANDARD.encode(&self.config.bucket),
            STANDARD.encode(key),
            STANDARD.encode(content_type_for(Path::new(key))),
        )
    }
}

/// An open resumable upload.
pub struct ResumableSession<'a> {
    uploader: &'a ResumableUploader,
    key: String,
    location: Url,
    total_len: u64,
    offset: u64,
    state: SessionState,
}

impl ResumableSession<'_> {
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Sends the next chunk at the current offset and returns the new offset.
    pub async fn send_chunk(&mut self, chunk: Bytes) -> Result<u64> {
        let offset = self.offset;
        match self.state {
            SessionState::Created | SessionState::Uploading { .. } => {}
            state => {
                return Err(UploadError::Chunk {
                    offset,
                    reason: format!("session is {:?}", state),
                });
            }
        }

        let next = offset + chunk.len() as u64;
        if next > self.total_len {
            return Err(self.fail(offset, format!(
                "chunk of {} bytes overruns declared length {}",
                chunk.len(),
                self.total_len
            )));
        }

        let config = &self.uploader.config;
        let response = self
            .uploader
            .client
            .patch(self.location.clone())
            .service_key(&config.service_key)
            .header("Tus-Resumable", TUS_VERSION)
            .header("Upload-Offset", offset)
            .header(CONTENT_TYPE, OFFSET_OCTET_STREAM)
            .header(CONTENT_LENGTH, chunk.len())
            .timeout(config.upload_timeout)
            .body(chunk)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => return Err(self.fail(offset, e.to_string())),
        };

        let status = response.status();
        if !matches!(
            status,
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT
        ) {
            let body = response.text().await.unwrap_or_default();
            return Err(self.fail(offset, format!("{} - {}", status, truncate_body(&body))));
        }

        let acknowledged = response
            .headers()
            .get("Upload-Offset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        if let Some(acknowledged) = acknowledged
            && acknowledged != next
        {
            return Err(self.fail(
                offset,
                format!("server acknowledged offset {} instead of {}", acknowledged, next),
            ));
        }

        self.offset = next;
        self.state = if next == self.total_len {
            SessionState::Complete
        } else {
            SessionState::Uploading { offset: next }
        };
        Ok(next)
    }

    /// Streams the remaining bytes from `reader` and returns the storage key
    /// once the session is complete.
    pub async fn send_from<R>(&mut self, mut reader: R) -> Result<String>
    where
        R: AsyncRead + Unpin + Send,
    {
        let chunk_size = self.uploader.chunk_size();
        let start = self.offset;
        let spans: Vec<ChunkSpan> = chunk_spans(self.total_len, chunk_size)
            .filter(|span| span.offset >= start)
            .collect();
        let mut buffer = vec![0u8; chunk_size.max(1)];

        for span in spans {
            let mut n = 0;
            while n < span.len {
                let read = match reader.read(&mut buffer[n..span.len]).await {
                    Ok(read) => read,
                    Err(e) => {
                        self.state = SessionState::Failed;
                        return Err(UploadError::Io(e));
                    }
                };
                if read == 0 {
                    self.state = SessionState::Failed;
                    return Err(UploadError::ShortRead {
                        read: span.offset + n as u64,
                        expected: self.total_len,
                    });
                }
                n += read;
            }

            let offset = self.send_chunk(Bytes::copy_from_slice(&buffer[..n])).await?;
            info!(
                "    Progress: {:.1}% ({} / {})",
                percent(offset, self.total_len),
                megabytes(offset),
                megabytes(self.total_len)
            );
        }

        if self.total_len == 0 {
            self.state = SessionState::Complete;
        }

        Ok(self.key.clone())
    }

    fn fail(&mut self, offset: u64, reason: String) -> UploadError {
        self.state = SessionState::Failed;
        UploadError::Chunk { offset, reason }
    }
}
