use crate::error::{Result, UploadError};
use std::env;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Connection and tuning settings shared by every upload tool
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base URL of the storage project, without a trailing slash
    pub base_url: String,

    /// Service key sent as bearer token and `apikey` header
    pub service_key: String,

    /// Target bucket (default: "audio-files")
    pub bucket: String,

    /// REST table receiving one row per uploaded track (default: "audio_tracks")
    pub records_table: String,

    /// Channel every inserted track is registered under
    pub channel_id: Option<Uuid>,

    /// Timeout for a single object upload or resumable chunk (default: 300s)
    pub upload_timeout: Duration,

    /// Timeout for record inserts (default: 30s)
    pub record_timeout: Duration,

    /// Timeout for downloads from the remote file host (default: 600s)
    pub download_timeout: Duration,

    /// Objects requested per listing page (default: 1000)
    pub list_page_size: usize,

    /// Keys per bulk-delete request (default: 100)
    pub delete_batch_size: usize,

    /// Chunk size for resumable uploads in bytes (default: 6 MB)
    pub resumable_chunk_size: usize,

    /// Download endpoint of the remote file host
    pub remote_download_url: String,
}

impl StorageConfig {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            bucket: "audio-files".to_string(),
            records_table: "audio_tracks".to_string(),
            channel_id: None,
            upload_timeout: Duration::from_secs(300),
            record_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(600),
            list_page_size: 1000,
            delete_batch_size: 100,
            resumable_chunk_size: 6 * 1024 * 1024, // 6 MB
            remote_download_url: "https://drive.google.com/uc".to_string(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first_of = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
        };

        let base_url = first_of(&["STORAGE_URL", "SUPABASE_URL", "VITE_SUPABASE_URL"])
            .ok_or_else(|| UploadError::Config("STORAGE_URL must be set".to_string()))?;
        let service_key = first_of(&[
            "STORAGE_SERVICE_KEY",
            "SUPABASE_SERVICE_ROLE_KEY",
            "VITE_SUPABASE_ANON_KEY",
        ])
        .ok_or_else(|| UploadError::Config("STORAGE_SERVICE_KEY must be set".to_string()))?;

        let default = Self::new(base_url, service_key);
        let secs = |name: &str, fallback: Duration| {
            lookup(name)
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };
        let size = |name: &str, fallback: usize| {
            lookup(name)
                .and_then(|v| v.parse().ok())
                .filter(|v: &usize| *v > 0)
                .unwrap_or(fallback)
        };

        let channel_id = match lookup("CHANNEL_ID").filter(|v| !v.trim().is_empty()) {
            Some(raw) => Some(Uuid::parse_str(raw.trim()).map_err(|e| {
                UploadError::Config(format!("CHANNEL_ID is not a valid UUID: {}", e))
            })?),
            None => None,
        };

        Ok(Self {
            bucket: lookup("STORAGE_BUCKET").unwrap_or(default.bucket.clone()),
            records_table: lookup("RECORDS_TABLE").unwrap_or(default.records_table.clone()),
            channel_id,
            upload_timeout: secs("UPLOAD_TIMEOUT_SECS", default.upload_timeout),
            record_timeout: secs("RECORD_TIMEOUT_SECS", default.record_timeout),
            download_timeout: secs("DOWNLOAD_TIMEOUT_SECS", default.download_timeout),
            list_page_size: size("LIST_PAGE_SIZE", default.list_page_size),
            delete_batch_size: size("DELETE_BATCH_SIZE", default.delete_batch_size),
            resumable_chunk_size: size("RESUMABLE_CHUNK_SIZE", default.resumable_chunk_size),
            remote_download_url: lookup("REMOTE_DOWNLOAD_URL")
                .unwrap_or(default.remote_download_url.clone()),
            ..default
        })
    }

    /// Channel id for tools that insert records; absent is a configuration error.
    pub fn require_channel(&self) -> Result<Uuid> {
        self.channel_id
            .ok_or_else(|| UploadError::Config("CHANNEL_ID must be set".to_string()))
    }

    /// Upload URL for `key`. Every `/`-separated segment is percent-encoded,
    /// so `#`, `?`, `%` and spaces stay part of the key.
    pub fn object_url(&self, key: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            UploadError::Config(format!("invalid storage URL {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                UploadError::Config(format!("storage URL {} cannot have a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(["storage", "v1", "object", self.bucket.as_str()])
            .extend(key.split('/'));
        Ok(url)
    }

    pub fn list_url(&self) -> String {
        format!("{}/storage/v1/object/list/{}", self.base_url, self.bucket)
    }

    pub fn bucket_url(&self) -> String {
        format!("{}/storage/v1/object/{}", self.base_url, self.bucket)
    }

    pub fn resumable_url(&self) -> String {
        format!("{}/storage/v1/upload/resumable", self.base_url)
    }

    pub fn records_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.records_table)
    }
}
