//! Environment/runtime helpers
//!
//! Sanity checks to ensure the data root exists and is writable at startup.

use std::path::Path;

use tracing::{info, warn};

const WRITE_CHECK_FILE: &str = ".myday-write-check";

/// Ensure the data directory exists and accepts writes.
///
/// A read-only mount is reported at startup instead of on the first mutation.
pub async fn ensure_data_dir(data_dir: &Path) -> anyhow::Result<()> {
    if tokio::fs::metadata(data_dir).await.is_err() {
        warn!(data_dir = %data_dir.display(), "data directory not found; creating it (state will not outlive the container unless mounted)");
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", data_dir.display()))?;

    let marker = data_dir.join(WRITE_CHECK_FILE);
    tokio::fs::write(&marker, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("data directory {} is not writable: {e}", data_dir.display()))?;
    let _ = tokio::fs::remove_file(&marker).await;

    info!(data_dir = %data_dir.display(), "data directory ready");
    Ok(())
}
