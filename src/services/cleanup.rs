use crate::services::storage::StorageService;
use crate::utils::validation::has_extension;
use std::path::Path;
use tracing::{info, warn};

/// Aggregate of a batched delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub deleted: usize,
    pub failed: usize,
}

/// Number of requests needed to delete `total` keys.
pub fn batch_count(total: usize, batch_size: usize) -> usize {
    total.div_ceil(batch_size.max(1))
}

/// Deletes keys in fixed-size batches, one request per batch. A failed batch
/// is counted and the next batch is still attempted.
pub async fn delete_in_batches(
    storage: &dyn StorageService,
    keys: &[String],
    batch_size: usize,
) -> DeleteSummary {
    let mut summary = DeleteSummary::default();
    let batches = batch_count(keys.len(), batch_size);

    for (i, batch) in keys.chunks(batch_size.max(1)).enumerate() {
        match storage.delete_objects(batch).await {
            Ok(()) => {
                summary.deleted += batch.len();
                info!("Deleting batch {}/{}... ✓", i + 1, batches);
            }
            Err(e) => {
                summary.failed += batch.len();
                warn!("Deleting batch {}/{}... ✗ ({})", i + 1, batches, e);
            }
        }
    }

    summary
}

/// Lists the bucket under `prefix` and keeps keys with the given extension,
/// compared the same way the local scanner compares it. A failed listing is
/// logged and treated as empty.
pub async fn list_with_extension(
    storage: &dyn StorageService,
    prefix: &str,
    extension: &str,
) -> Vec<String> {
    info!("Listing files with prefix '{}'...", prefix);

    match storage.list_objects(prefix).await {
        Ok(names) => names
            .into_iter()
            .filter(|name| has_extension(Path::new(name), extension))
            .collect(),
        Err(e) => {
            warn!("Failed to list files ({})", e);
            Vec::new()
        }
    }
}
