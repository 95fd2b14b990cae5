use crate::AppState;
use crate::config::StorageConfig;
use crate::error::Result;
use crate::infrastructure::http::setup_client;
use crate::services::records::RecordService;
use crate::services::remote_source::DriveSource;
use crate::services::resumable::ResumableUploader;
use crate::services::storage::HttpStorageService;
use std::sync::Arc;

/// Wires every service against the configured storage project.
pub fn setup_storage(config: StorageConfig) -> Result<AppState> {
    let client = setup_client(&config)?;
    let config = Arc::new(config);

    Ok(AppState {
        storage: Arc::new(HttpStorageService::new(client.clone(), config.clone())),
        resumable: Arc::new(ResumableUploader::new(client.clone(), config.clone())),
        records: Arc::new(RecordService::new(client.clone(), config.clone())),
        remote: Arc::new(DriveSource::new(client, config.clone())),
        config,
    })
}
