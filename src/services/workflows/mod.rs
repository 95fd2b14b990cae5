//! The per-tool upload runs. Each run walks its work list one item at a time
//! and returns a [`RunSummary`]; binaries turn that into an exit code.

pub mod batch;
pub mod bulk;
pub mod clean_slate;
pub mod remote;

use crate::AppState;
use crate::error::Result;
use crate::models::{OutcomeState, RunSummary, UploadOutcome};
use crate::services::scanner::DirectoryScanner;
use crate::services::storage::UploadOptions;
use crate::utils::format::{gigabytes, megabytes};
use std::path::Path;
use tracing::{error, info, warn};

pub(crate) const RULE: &str = "------------------------------------------------------------";
pub(crate) const DOUBLE_RULE: &str =
    "============================================================";

/// How local files are pushed to the bucket.
#[derive(Debug, Clone, Default)]
pub struct LocalUploadPolicy {
    pub options: UploadOptions,
    /// Files strictly larger than this go through the resumable endpoint.
    pub resumable_over: Option<u64>,
}

/// Uploads one local file with the configured policy.
pub(crate) async fn upload_local_file(
    state: &AppState,
    path: &Path,
    key: &str,
    size: u64,
    policy: &LocalUploadPolicy,
) -> Result<()> {
    match policy.resumable_over {
        Some(limit) if size > limit => {
            state.resumable.upload_file(key, path).await?;
        }
        _ => state.storage.upload_file(key, path, policy.options).await?,
    }
    Ok(())
}

/// Uploads every matching file under the scanner's root, keyed under `prefix`.
pub(crate) async fn upload_directory(
    state: &AppState,
    scanner: &DirectoryScanner,
    prefix: &str,
    policy: &LocalUploadPolicy,
) -> RunSummary {
    let mut summary = RunSummary::default();
    let extension = scanner.extension().to_uppercase();

    let files = match scanner.collect_sorted() {
        Ok(files) => files,
        Err(e) => {
            error!("Error: {}", e);
            summary.issue(e.to_string());
            return summary;
        }
    };

    if files.is_empty() {
        info!(
            "No {} files found in {}",
            extension,
            scanner.root().display()
        );
        return summary;
    }

    let total_size: u64 = files.iter().map(|f| f.size).sum();
    info!(
        "Found {} {} files ({})",
        files.len(),
        extension,
        gigabytes(total_size)
    );
    info!(
        "Upload destination: {}/{}",
        state.config.bucket,
        prefix.trim_matches('/')
    );
    info!("{}", RULE);

    let total = files.len();
    for (i, file) in files.into_iter().enumerate() {
        let path = file.path.clone();
        let item = file.into_work_item(prefix);
        let size = item.size.unwrap_or_default();
        info!(
            "[{}/{}] Uploading {} ({})...",
            i + 1,
            total,
            item.display_name(),
            megabytes(size)
        );

        match upload_local_file(state, &path, &item.key, size, policy).await {
            Ok(()) => {
                info!("  ✓ {}", item.key);
                summary.push(UploadOutcome::succeeded(item));
            }
            Err(e) => {
                error!("  ✗ {}", e);
                summary.push(UploadOutcome::failed(item, e.to_string()));
            }
        }
    }

    info!("{}", RULE);
    summary
}

/// Logs the failed items and run-level issues of a summary.
pub fn report_failures(summary: &RunSummary) {
    let failed = summary.failed();
    if !failed.is_empty() {
        warn!("Failed uploads ({} files):", failed.len());
        for outcome in failed {
            if let OutcomeState::Failed(reason) = &outcome.state {
                error!("  - {}: {}", outcome.item, reason);
            }
        }
    }
    for issue in &summary.issues {
        error!("  ! {}", issue);
    }
}
