use super::{DOUBLE_RULE, report_failures};
use crate::AppState;
use crate::error::{Result, UploadError};
use crate::models::{RecordOutcome, RunSummary, TrackRecord, UploadOutcome, WorkItem};
use crate::services::records::ConflictMode;
use crate::utils::format::megabytes;
use crate::utils::keys::{join_key, sequential_name};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RemoteUploadOptions {
    pub prefix: String,
    pub source_tag: String,
    pub channel_id: Uuid,
    /// Number given to the first file; names are `track_NNN.mp3`.
    pub start_number: u32,
}

impl RemoteUploadOptions {
    pub fn new(channel_id: Uuid) -> Self {
        Self {
            prefix: "audio-tracks".to_string(),
            source_tag: "google_drive_uploaded".to_string(),
            channel_id,
            start_number: 1,
        }
    }
}

/// Downloads each remote file, pushes it through a resumable session and
/// registers a track record for it.
pub async fn run_remote_upload(
    state: &AppState,
    file_ids: &[String],
    options: &RemoteUploadOptions,
) -> RunSummary {
    let mut summary = RunSummary::default();
    let numbers = match track_numbers(options.start_number, file_ids.len()) {
        Ok(numbers) => numbers,
        Err(e) => {
            error!("Error: {}", e);
            summary.issue(e.to_string());
            return summary;
        }
    };

    let total = file_ids.len();
    info!("Uploading {} files to {} storage...", total, state.config.bucket);

    for (idx, (file_id, number)) in file_ids.iter().zip(numbers).enumerate() {
        let key = join_key(&options.prefix, &sequential_name(number, "mp3"));
        let item = WorkItem::remote(file_id.clone(), number, key);
        info!("[{}/{}] Processing {}...", idx + 1, total, item.display_name());

        match transfer(state, &item, file_id).await {
            Ok(stored_key) => {
                info!("  ✓ Uploaded to storage");
                let record = TrackRecord::new(options.channel_id, stored_key, &options.source_tag)
                    .with_remote_origin(file_id.clone(), number);
                let outcome = state
                    .records
                    .insert_track(&record, ConflictMode::ReturnMinimal)
                    .await;
                if outcome == RecordOutcome::Inserted {
                    info!("  ✓ Database record created");
                }
                summary.push(UploadOutcome::succeeded(item).with_record(outcome));
            }
            Err(e) => {
                error!("  ✗ Error: {}", e);
                summary.push(UploadOutcome::failed(item, e.to_string()));
            }
        }
    }

    info!("{}", DOUBLE_RULE);
    info!("Upload Complete!");
    info!("Success: {} files", summary.succeeded());
    info!("Failed: {} files", summary.failed().len());
    info!("{}", DOUBLE_RULE);
    report_failures(&summary);

    summary
}

/// Track numbers for `count` files starting at `start`.
///
/// # Errors
/// `Usage` if the last number does not fit in a `u32`.
fn track_numbers(start: u32, count: usize) -> Result<Vec<u32>> {
    (0..count)
        .map(|i| {
            u32::try_from(i)
                .ok()
                .and_then(|i| start.checked_add(i))
                .ok_or_else(|| {
                    UploadError::Usage(format!(
                        "start number {} leaves no room for {} files",
                        start, count
                    ))
                })
        })
        .collect()
}

async fn transfer(state: &AppState, item: &WorkItem, file_id: &str) -> Result<String> {
    info!("  Downloading from {}...", state.remote.source_id());
    let downloaded = state.remote.download(file_id).await?;
    info!("  Downloaded {}", megabytes(downloaded.len));

    info!("  Uploading to storage (resumable)...");
    state
        .resumable
        .upload(&item.key, downloaded.file, downloaded.len)
        .await
}
