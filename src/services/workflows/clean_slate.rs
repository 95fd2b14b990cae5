use super::{DOUBLE_RULE, LocalUploadPolicy, report_failures, upload_directory};
use crate::AppState;
use crate::models::RunSummary;
use crate::services::cleanup::{DeleteSummary, delete_in_batches, list_with_extension};
use crate::services::scanner::DirectoryScanner;
use std::path::Path;
use tracing::{info, warn};

const AUDIO_EXTENSION: &str = "mp3";
const SIDECAR_EXTENSION: &str = "json";

/// Result of a clean-slate import, split by phase.
#[derive(Debug, Default)]
pub struct CleanSlateReport {
    pub audio_deleted: DeleteSummary,
    pub sidecars_deleted: DeleteSummary,
    pub audio: RunSummary,
    pub sidecars: RunSummary,
}

impl CleanSlateReport {
    /// Folds both upload phases and any failed deletes into one summary.
    pub fn into_summary(self) -> RunSummary {
        let mut summary = RunSummary::default();
        for (label, deleted) in [
            ("audio", self.audio_deleted),
            ("sidecar", self.sidecars_deleted),
        ] {
            if deleted.failed > 0 {
                summary.issue(format!("{} existing {} files could not be deleted", deleted.failed, label));
            }
        }
        summary.merge(self.audio);
        summary.merge(self.sidecars);
        summary
    }
}

/// Deletes every audio file and sidecar in the bucket, then uploads the two
/// local directories in their place.
pub async fn run_clean_slate(
    state: &AppState,
    audio_dir: &Path,
    json_dir: &Path,
) -> CleanSlateReport {
    info!("{}", DOUBLE_RULE);
    info!("CLEAN SLATE AUDIO IMPORT");
    info!("{}", DOUBLE_RULE);

    let mut report = CleanSlateReport::default();

    info!("[STEP 1/4] Deleting existing audio files...");
    report.audio_deleted = purge(state, AUDIO_EXTENSION).await;

    info!("[STEP 2/4] Deleting existing JSON sidecars...");
    report.sidecars_deleted = purge(state, SIDECAR_EXTENSION).await;

    let policy = LocalUploadPolicy::default();

    info!("[STEP 3/4] Uploading new audio files...");
    let scanner = DirectoryScanner::new(audio_dir, AUDIO_EXTENSION);
    report.audio = upload_directory(state, &scanner, "", &policy).await;
    info!(
        "Uploaded: {}/{} MP3 files",
        report.audio.succeeded(),
        report.audio.total()
    );

    info!("[STEP 4/4] Uploading new JSON sidecars...");
    let scanner = DirectoryScanner::new(json_dir, SIDECAR_EXTENSION);
    report.sidecars = upload_directory(state, &scanner, "", &policy).await;
    info!(
        "Uploaded: {}/{} JSON files",
        report.sidecars.succeeded(),
        report.sidecars.total()
    );

    info!("{}", DOUBLE_RULE);
    info!("IMPORT COMPLETE");
    info!("{}", DOUBLE_RULE);
    info!(
        "Audio files: {}/{} uploaded",
        report.audio.succeeded(),
        report.audio.total()
    );
    info!(
        "JSON files: {}/{} uploaded",
        report.sidecars.succeeded(),
        report.sidecars.total()
    );

    if !report.audio.is_clean() || !report.sidecars.is_clean() {
        warn!("Some files failed to upload. Check the output above for details.");
        report_failures(&report.audio);
        report_failures(&report.sidecars);
    }

    report
}

async fn purge(state: &AppState, extension: &str) -> DeleteSummary {
    let keys = list_with_extension(state.storage.as_ref(), "", extension).await;
    let label = extension.to_uppercase();

    if keys.is_empty() {
        info!("No {} files found to delete", label);
        return DeleteSummary::default();
    }

    info!("Found {} {} files to delete", keys.len(), label);
    let deleted =
        delete_in_batches(state.storage.as_ref(), &keys, state.config.delete_batch_size).await;
    info!("Deleted: {} files", deleted.deleted);
    if deleted.failed > 0 {
        warn!("Failed: {} files", deleted.failed);
    }
    deleted
}
