use crate::config::StorageConfig;
use crate::error::Result;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::info;

/// Shared HTTP client. Per-request timeouts are applied by each service.
pub fn setup_client(config: &StorageConfig) -> Result<Client> {
    info!("☁️  Storage API: {} (Bucket: {})", config.base_url, config.bucket);

    let client = Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Attaches the service key the storage API expects on every call.
pub trait ServiceKeyAuth {
    fn service_key(self, key: &str) -> Self;
}

impl ServiceKeyAuth for RequestBuilder {
    fn service_key(self, key: &str) -> Self {
        self.bearer_auth(key).header("apikey", key)
    }
}
