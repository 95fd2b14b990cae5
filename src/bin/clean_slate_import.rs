use audio_uploader::config::StorageConfig;
use audio_uploader::infrastructure::{logging::init_tracing, storage::setup_storage};
use audio_uploader::services::workflows::clean_slate::run_clean_slate;
use audio_uploader::utils::cli::parse_args;
use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing::error;

/// Replace every MP3 and JSON sidecar in the bucket with the local copies.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory holding the new MP3 files
    audio_directory: PathBuf,

    /// Directory holding the new JSON sidecars
    json_directory: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args: Args = parse_args();
    init_tracing("clean_slate_import");

    let config = match StorageConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ {}", e);
            std::process::exit(1);
        }
    };
    let state = setup_storage(config)?;

    let report = run_clean_slate(&state, &args.audio_directory, &args.json_directory).await;
    std::process::exit(report.into_summary().exit_code());
}
