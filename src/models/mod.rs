use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Where the bytes of a work item come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkSource {
    Local(PathBuf),
    Remote { file_id: String, sequence: u32 },
}

/// One file to transfer and the key it will be stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub source: WorkSource,
    pub key: String,
    pub size: Option<u64>,
}

impl WorkItem {
    pub fn local(path: PathBuf, key: String, size: u64) -> Self {
        Self {
            source: WorkSource::Local(path),
            key,
            size: Some(size),
        }
    }

    pub fn remote(file_id: impl Into<String>, sequence: u32, key: String) -> Self {
        Self {
            source: WorkSource::Remote {
                file_id: file_id.into(),
                sequence,
            },
            key,
            size: None,
        }
    }

    /// Short name for progress lines.
    pub fn display_name(&self) -> String {
        match &self.source {
            WorkSource::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.key.clone()),
            WorkSource::Remote { .. } => self.key.rsplit('/').next().unwrap_or(&self.key).to_string(),
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            WorkSource::Local(path) => write!(f, "{}", path.display()),
            WorkSource::Remote { file_id, .. } => write!(f, "{} ({})", self.key, file_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeState {
    Succeeded,
    Failed(String),
}

/// Result of the record-insert step that follows a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Inserted,
    /// Insert was rejected or never answered; the row likely exists already.
    MayExist { reason: String },
}

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub item: WorkItem,
    pub state: OutcomeState,
    pub record: Option<RecordOutcome>,
}

impl UploadOutcome {
    pub fn succeeded(item: WorkItem) -> Self {
        Self {
            item,
            state: OutcomeState::Succeeded,
            record: None,
        }
    }

    pub fn failed(item: WorkItem, reason: impl Into<String>) -> Self {
        Self {
            item,
            state: OutcomeState::Failed(reason.into()),
            record: None,
        }
    }

    pub fn with_record(mut self, record: RecordOutcome) -> Self {
        self.record = Some(record);
        self
    }

    pub fn is_success(&self) -> bool {
        self.state == OutcomeState::Succeeded
    }
}

/// Aggregated result of one tool run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<UploadOutcome>,
    /// Run-level problems that are not tied to a single item.
    pub issues: Vec<String>,
}

impl RunSummary {
    pub fn push(&mut self, outcome: UploadOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn issue(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
    }

    pub fn merge(&mut self, other: RunSummary) {
        self.outcomes.extend(other.outcomes);
        self.issues.extend(other.issues);
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> Vec<&UploadOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success()).collect()
    }

    pub fn records_may_exist(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.record, Some(RecordOutcome::MayExist { .. })))
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.failed().is_empty()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_clean() { 0 } else { 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// Provenance of an inserted track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_number: Option<u32>,
}

/// Row inserted into the tracks table for every uploaded audio file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub channel_id: Uuid,
    pub energy_level: EnergyLevel,
    pub file_path: String,
    pub duration_seconds: u32,
    pub metadata: RecordMetadata,
}

impl TrackRecord {
    /// Duration stored until the real length is probed.
    pub const PLACEHOLDER_DURATION_SECS: u32 = 180;

    pub fn new(channel_id: Uuid, file_path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            channel_id,
            energy_level: EnergyLevel::default(),
            file_path: file_path.into(),
            duration_seconds: Self::PLACEHOLDER_DURATION_SECS,
            metadata: RecordMetadata {
                source: source.into(),
                file_id: None,
                track_number: None,
            },
        }
    }

    pub fn with_remote_origin(mut self, file_id: impl Into<String>, track_number: u32) -> Self {
        self.metadata.file_id = Some(file_id.into());
        self.metadata.track_number = Some(track_number);
        self
    }
}

/// Entry returned by the bucket listing endpoint. Names are relative to the
/// listed prefix; folders come back with a null `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageObject {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

impl StorageObject {
    pub fn is_folder(&self) -> bool {
        self.id.is_none()
    }
}
