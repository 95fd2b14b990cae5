pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::StorageConfig;
use crate::services::records::RecordService;
use crate::services::remote_source::RemoteSource;
use crate::services::resumable::ResumableUploader;
use crate::services::storage::StorageService;
use std::sync::Arc;

/// Services shared by every upload run.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<StorageConfig>,
    pub storage: Arc<dyn StorageService>,
    pub resumable: Arc<ResumableUploader>,
    pub records: Arc<RecordService>,
    pub remote: Arc<dyn RemoteSource>,
}
