use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::types::MetricsSnapshot;

/// Write the snapshot as pretty-printed JSON, creating parent directories.
pub fn save_metrics_to_file(snapshot: &MetricsSnapshot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(snapshot).context("Failed to serialize metrics")?;
    fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Saved metrics to '{}'", path.display());
    Ok(())
}
