use super::{LocalUploadPolicy, report_failures, upload_directory};
use crate::AppState;
use crate::models::RunSummary;
use crate::services::scanner::DirectoryScanner;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone)]
pub struct BulkUploadOptions {
    /// Key prefix the directory structure is recreated under.
    pub prefix: String,
    pub extension: String,
    pub policy: LocalUploadPolicy,
}

impl Default for BulkUploadOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            extension: "mp3".to_string(),
            policy: LocalUploadPolicy::default(),
        }
    }
}

/// Uploads every audio file under `directory`, keeping relative paths as keys.
pub async fn run_bulk_upload(
    state: &AppState,
    directory: &Path,
    options: &BulkUploadOptions,
) -> RunSummary {
    let scanner = DirectoryScanner::new(directory, &options.extension);
    let summary = upload_directory(state, &scanner, &options.prefix, &options.policy).await;

    if summary.total() > 0 {
        info!(
            "Completed: {}/{} files uploaded successfully",
            summary.succeeded(),
            summary.total()
        );
    }
    report_failures(&summary);
    summary
}
