use audio_uploader::config::StorageConfig;
use audio_uploader::error::UploadError;
use audio_uploader::infrastructure::{logging::init_tracing, storage::setup_storage};
use audio_uploader::services::workflows::remote::{RemoteUploadOptions, run_remote_upload};
use audio_uploader::utils::cli::parse_args;
use clap::Parser;
use dotenvy::dotenv;
use std::path::{Path, PathBuf};
use tracing::error;

/// Download files from the remote host and push them through resumable uploads.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Remote file ids, uploaded in the given order
    file_ids: Vec<String>,

    /// File with one remote id per line (blank lines and `#` comments are skipped)
    #[arg(long, value_name = "PATH")]
    ids_file: Option<PathBuf>,

    /// Key prefix inside the bucket
    #[arg(long, default_value = "audio-tracks")]
    prefix: String,

    /// Number given to the first uploaded track
    #[arg(long, default_value_t = 1)]
    start_number: u32,

    /// Source tag written into each record's metadata
    #[arg(long, default_value = "google_drive_uploaded")]
    source: String,
}

fn read_ids_file(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args: Args = parse_args();
    init_tracing("remote_upload");

    let mut file_ids = args.file_ids;
    if let Some(path) = &args.ids_file {
        match read_ids_file(path) {
            Ok(ids) => file_ids.extend(ids),
            Err(e) => {
                error!("❌ Cannot read {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }
    if file_ids.is_empty() {
        let err = UploadError::Usage("pass file ids as arguments or with --ids-file".to_string());
        error!("❌ {}", err);
        std::process::exit(1);
    }

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

    let options = RemoteUploadOptions {
        prefix: args.prefix,
        source_tag: args.source,
        start_number: args.start_number,
        ..RemoteUploadOptions::new(channel_id)
    };
    let summary = run_remote_upload(&state, &file_ids, &options).await;
    std::process::exit(summary.exit_code());
}
