use audio_uploader::config::StorageConfig;
use audio_uploader::infrastructure::{logging::init_tracing, storage::setup_storage};
use audio_uploader::services::workflows::batch::{BatchUploadOptions, run_batch_upload};
use audio_uploader::utils::cli::parse_args;
use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing::error;

/// Upload the MP3 files of one directory and register a track for each.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory holding the MP3 files
    #[arg(default_value = "temp-mp3-files")]
    directory: PathBuf,

    /// Key prefix inside the bucket
    #[arg(long, default_value = "audio-tracks")]
    prefix: String,

    /// Source tag written into each record's metadata
    #[arg(long, default_value = "google_drive_import")]
    source: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args: Args = parse_args();
    init_tracing("batch_upload");

    let (config, channel_id) = match StorageConfig::from_env()
        .and_then(|config| config.require_channel().map(|channel| (config, channel)))
    {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("❌ {}", e);
            std::process::exit(1);
        }
    };
    let state = setup_storage(config)?;

    let options = BatchUploadOptions {
        prefix: args.prefix,
        source_tag: args.source,
        ..BatchUploadOptions::new(channel_id)
    };
    let summary = run_batch_upload(&state, &args.directory, &options).await;
    std::process::exit(summary.exit_code());
}
