//! Pushes training artifacts and the current model to the remote store.
//!
//! The `artifacts` folder syncs incrementally by (path, size); the model
//! folder is always re-uploaded so a freshly trained model of identical
//! size is never skipped.

use std::path::Path;

use anyhow::Context;
use tracing::info;

use phishguard_engine::{
    config::Config,
    sync::{upload_folder, HttpObjectStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "artifact_sync=info,phishguard_engine=info".into()),
        )
        .init();

    let config = Config::from_env();
    let store_url = config
        .store_url
        .as_deref()
        .context("PHISHGUARD_STORE_URL is not set")?;
    let store = HttpObjectStore::new(store_url);

    let uploaded = upload_folder(&store, Path::new("artifacts"), "artifacts", true).await?;
    info!("synced artifacts folder: {uploaded} file(s) uploaded");

    let uploaded = upload_folder(
        &store,
        &config.model_dir,
        &config.store_model_prefix,
        false,
    )
    .await?;
    info!("synced model folder: {uploaded} file(s) uploaded");

    Ok(())
}
