use crate::config::StorageConfig;
use crate::error::{Result, UploadError};
use crate::infrastructure::http::ServiceKeyAuth;
use crate::models::StorageObject;
use crate::utils::keys::join_key;
use crate::utils::validation::content_type_for;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

#[derive(Debug, Clone, Copy, Default)]
pub struct UploadOptions {
    /// Overwrite an existing object instead of failing with a conflict.
    pub upsert: bool,
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Streams a local file into the bucket under `key`.
    async fn upload_file(&self, key: &str, path: &Path, options: UploadOptions) -> Result<()>;

    /// Lists every object key under `prefix`, descending into folders.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut folders = vec![prefix.trim_matches('/').to_string()];

        while let Some(folder) = folders.pop() {
            for entry in self.list_folder(&folder).await? {
                let is_folder = entry.is_folder();
                let Some(name) = entry.name.filter(|n| !n.is_empty()) else {
                    continue;
                };
                let key = join_key(&folder, &name);
                if is_folder {
                    folders.push(key);
                } else {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn delete_objects(&self, keys: &[String]) -> Result<()>;
}

pub struct HttpStorageService {
    client: Client,
    config: Arc<StorageConfig>,
}

impl HttpStorageService {
    pub fn new(client: Client, config: Arc<StorageConfig>) -> Self {
        Self { client, config }
    }

    /// Lists the direct children of one folder, following pagination.
    async fn list_folder(&self, prefix: &str) -> Result<Vec<StorageObject>> {
        let limit = self.config.list_page_size;
        let mut entries = Vec::new();
        let mut offset = 0usize;

        loop {
            let response = self
                .client
                .post(self.config.list_url())
                .service_key(&self.config.service_key)
                .timeout(self.config.record_timeout)
                .json(&json!({
                    "limit": limit,
                    "offset": offset,
                    "prefix": prefix,
                }))
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(UploadError::from_response(response).await);
            }

            let page: Vec<StorageObject> = response.json().await?;
            let page_len = page.len();
            entries.extend(page);

            if page_len < limit || page_len == 0 {
                break;
            }
            offset += page_len;
        }

        Ok(entries)
    }
}

#[async_trait]
impl StorageService for HttpStorageService {
    async fn upload_file(&self, key: &str, path: &Path, options: UploadOptions) -> Result<()> {
        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let mut request = self
            .client
            .post(self.config.object_url(key)?)
            .service_key(&self.config.service_key)
            .header(CONTENT_TYPE, content_type_for(path))
            .header(CONTENT_LENGTH, size)
            .timeout(self.config.upload_timeout)
            .body(body);
        if options.upsert {
            request = request.header("x-upsert", "true");
        }

        let response = request.send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(UploadError::from_response(response).await)
        }
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>> {
        let limit = self.config.list_page_size;
        let mut names = Vec::new();
        let mut offset = 0usize;

        loop {
            let response = self
                .client
                .post(self.config.list_url())
                .service_key(&self.config.service_key)
                .timeout(self.config.record_timeout)
                .json(&json!({
                    "limit": limit,
                    "offset": offset,
                    "prefix": prefix,
                }))
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(UploadError::from_response(response).await);
            }

            let page: Vec<StorageObject> = response.json().await?;
            let page_len = page.len();
            names.extend(page.into_iter().filter_map(|o| o.name).filter(|n| !n.is_empty()));

            if page_len < limit || page_len == 0 {
                break;
            }
            offset += page_len;
        }

        Ok(names)
    }

    async fn delete_objects(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .delete(self.config.bucket_url())
            .service_key(&self.config.service_key)
            .timeout(self.config.upload_timeout)
            .json(&json!({ "prefixes": keys }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(UploadError::from_response(response).await)
        }
    }
}
