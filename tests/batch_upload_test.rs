mod common;

use audio_uploader::models::RecordOutcome;
use audio_uploader::services::workflows::batch::{BatchUploadOptions, run_batch_upload};
use common::{CHANNEL_ID, spawn, write_file};
use serde_json::json;
use tempfile::TempDir;
use uuid::Uuid;

fn options() -> BatchUploadOptions {
    BatchUploadOptions::new(Uuid::parse_str(CHANNEL_ID).unwrap())
}

#[tokio::test]
async fn test_batch_upload_overwrites_and_records_tracks() {
    let env = spawn().await;
    env.seed_object("audio-tracks/song.mp3");
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("song.mp3"), 4096);
    write_file(&dir.path().join("other.mp3"), 4096);
    // Only direct children are uploaded.
    write_file(&dir.path().join("nested/skip.mp3"), 4096);

    let summary = run_batch_upload(&env.state, dir.path(), &options()).await;

    assert_eq!(summary.total(), 2);
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.exit_code(), 0);

    let fake = env.fake();
    assert!(fake.uploads.iter().all(|u| u.upsert));
    assert_eq!(fake.objects["audio-tracks/song.mp3"].data.len(), 4096);
    assert!(!fake.objects.contains_key("audio-tracks/nested/skip.mp3"));

    assert_eq!(fake.records.len(), 2);
    let record = &fake.records[0];
    assert_eq!(record.table, "audio_tracks");
    assert_eq!(record.prefer, "resolution=ignore-duplicates");
    assert_eq!(
        record.body,
        json!({
            "channel_id": CHANNEL_ID,
            "energy_level": "medium",
            "file_path": "audio-tracks/other.mp3",
            "duration_seconds": 180,
            "metadata": {"source": "google_drive_import"}
        })
    );
}

#[tokio::test]
async fn test_record_conflict_still_counts_as_success() {
    let env = spawn().await;
    env.fake().reject_records = true;
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("song.mp3"), 128);

    let summary = run_batch_upload(&env.state, dir.path(), &options()).await;

    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.records_may_exist(), 1);
    assert_eq!(summary.exit_code(), 0);
    match &summary.outcomes[0].record {
        Some(RecordOutcome::MayExist { reason }) => assert!(reason.contains("409"), "{}", reason),
        other => panic!("unexpected record outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_upload_skips_record() {
    let env = spawn().await;
    env.fake()
        .reject_uploads
        .insert("audio-tracks/a.mp3".to_string());
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("a.mp3"), 128);
    write_file(&dir.path().join("b.mp3"), 128);

    let summary = run_batch_upload(&env.state, dir.path(), &options()).await;

    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.exit_code(), 1);
    let fake = env.fake();
    assert_eq!(fake.records.len(), 1);
    assert_eq!(fake.records[0].body["file_path"], "audio-tracks/b.mp3");
}

#[tokio::test]
async fn test_custom_prefix_and_source() {
    let env = spawn().await;
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("a.mp3"), 16);

    let options = BatchUploadOptions {
        prefix: "/imports/".to_string(),
        source_tag: "manual".to_string(),
        ..options()
    };
    run_batch_upload(&env.state, dir.path(), &options).await;

    let fake = env.fake();
    assert!(fake.objects.contains_key("imports/a.mp3"));
    assert_eq!(fake.records[0].body["metadata"]["source"], "manual");
}
