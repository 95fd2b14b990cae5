use super::{DOUBLE_RULE, LocalUploadPolicy, report_failures, upload_local_file};
use crate::AppState;
use crate::models::{RecordOutcome, RunSummary, TrackRecord, UploadOutcome, WorkItem};
use crate::services::records::ConflictMode;
use crate::services::scanner::DirectoryScanner;
use crate::services::storage::UploadOptions;
use crate::utils::format::megabytes;
use crate::utils::keys::join_key;
use std::path::Path;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct BatchUploadOptions {
    pub prefix: String,
    /// Provenance tag stored in each record's metadata.
    pub source_tag: String,
    pub channel_id: Uuid,
}

impl BatchUploadOptions {
    pub fn new(channel_id: Uuid) -> Self {
        Self {
            prefix: "audio-tracks".to_string(),
            source_tag: "google_drive_import".to_string(),
            channel_id,
        }
    }
}

/// Uploads the audio files directly inside `directory` (overwriting existing
/// objects) and registers one track record per uploaded file.
pub async fn run_batch_upload(
    state: &AppState,
    directory: &Path,
    options: &BatchUploadOptions,
) -> RunSummary {
    let mut summary = RunSummary::default();
    let scanner = DirectoryScanner::new(directory, "mp3").non_recursive();

    let files = match scanner.collect_sorted() {
        Ok(files) => files,
        Err(e) => {
            error!("Error: {}", e);
            summary.issue(e.to_string());
            return summary;
        }
    };

    let total = files.len();
    info!("{}", DOUBLE_RULE);
    info!("Uploading {} files to {}", total, state.config.bucket);
    info!("{}", DOUBLE_RULE);

    let policy = LocalUploadPolicy {
        options: UploadOptions { upsert: true },
        resumable_over: None,
    };

    for (i, file) in files.into_iter().enumerate() {
        let filename = file.relative.to_string_lossy().into_owned();
        let key = join_key(&options.prefix, &filename);
        info!("[{}/{}] {}", i + 1, total, filename);
        info!("  File size: {}", megabytes(file.size));
        info!("  Uploading to storage...");

        let path = file.path.clone();
        let item = WorkItem::local(file.path, key, file.size);

        if let Err(e) = upload_local_file(state, &path, &item.key, file.size, &policy).await {
            error!("  ✗ Upload failed: {}", e);
            summary.push(UploadOutcome::failed(item, e.to_string()));
            continue;
        }
        info!("  ✓ Uploaded to storage");

        let record = TrackRecord::new(options.channel_id, item.key.clone(), &options.source_tag);
        let outcome = state
            .records
            .insert_track(&record, ConflictMode::IgnoreDuplicates)
            .await;
        if outcome == RecordOutcome::Inserted {
            info!("  ✓ Database record created");
        }
        summary.push(UploadOutcome::succeeded(item).with_record(outcome));
    }

    info!("{}", DOUBLE_RULE);
    info!("Upload Complete!");
    info!("Success: {} files", summary.succeeded());
    info!("Failed: {} files", summary.failed().len());
    info!("{}", DOUBLE_RULE);
    report_failures(&summary);

    summary
}
