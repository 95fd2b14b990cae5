use audio_uploader::config::StorageConfig;
use audio_uploader::infrastructure::{logging::init_tracing, storage::setup_storage};
use audio_uploader::services::workflows::LocalUploadPolicy;
use audio_uploader::services::workflows::bulk::{BulkUploadOptions, run_bulk_upload};
use audio_uploader::utils::cli::parse_args;
use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing::{error, info};

/// Upload every MP3 under a directory, keeping its layout as storage keys.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Local directory to upload
    directory: PathBuf,

    /// Key prefix inside the bucket
    #[arg(default_value = "")]
    prefix: String,

    /// Route files larger than this many MiB through resumable uploads
    #[arg(long, value_name = "MB")]
    resumable_over_mb: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args: Args = parse_args();
    init_tracing("bulk_upload");

    let config = match StorageConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ {}", e);
            std::process::exit(1);
        }
    };
    let state = setup_storage(config)?;

    info!("📦 Bulk upload from {}", args.directory.display());
    let options = BulkUploadOptions {
        prefix: args.prefix,
        policy: LocalUploadPolicy {
            resumable_over: args.resumable_over_mb.map(|mb| mb * 1024 * 1024),
            ..Default::default()
        },
        ..Default::default()
    };

    let summary = run_bulk_upload(&state, &args.directory, &options).await;
    std::process::exit(summary.exit_code());
}
