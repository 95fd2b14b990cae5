use crate::config::StorageConfig;
use crate::error::truncate_body;
use crate::infrastructure::http::ServiceKeyAuth;
use crate::models::{RecordOutcome, TrackRecord};
use reqwest::Client;
use std::sync::Arc;
use tracing::warn;

/// How the REST endpoint should treat a duplicate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictMode {
    /// Silently skip rows that collide with an existing key.
    IgnoreDuplicates,
    /// Insert normally and return no representation.
    ReturnMinimal,
}

impl ConflictMode {
    pub fn prefer_header(self) -> &'static str {
        match self {
            ConflictMode::IgnoreDuplicates => "resolution=ignore-duplicates",
            ConflictMode::ReturnMinimal => "return=minimal",
        }
    }
}

pub struct RecordService {
    client: Client,
    config: Arc<StorageConfig>,
}

impl RecordService {
    pub fn new(client: Client, config: Arc<StorageConfig>) -> Self {
        Self { client, config }
    }

    /// Inserts one track row. Never fails: any rejection is reported as
    /// [`RecordOutcome::MayExist`].
    pub async fn insert_track(&self, record: &TrackRecord, mode: ConflictMode) -> RecordOutcome {
        let response = self
            .client
            .post(self.config.records_url())
            .service_key(&self.config.service_key)
            .header("Prefer", mode.prefer_header())
            .timeout(self.config.record_timeout)
            .json(record)
            .send()
            .await;

        let reason = match response {
            Ok(response) if response.status().is_success() => return RecordOutcome::Inserted,
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                format!("HTTP {} {}", status.as_u16(), truncate_body(&body))
                    .trim_end()
                    .to_string()
            }
            Err(e) => e.to_string(),
        };

        warn!(
            "  ⚠ Database record may already exist for {} ({})",
            record.file_path, reason
        );
        RecordOutcome::MayExist { reason }
    }
}
