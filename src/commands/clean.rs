//! Remove the destination directory

use anyhow::{Context, Result};
use std::fs;

use crate::generator::STAGING_PREFIX;
use crate::Site;

/// Delete the published site and any staging leftovers of a killed build
pub fn run(site: &Site) -> Result<()> {
    if site.dest_dir.exists() {
        fs::remove_dir_all(&site.dest_dir)
            .with_context(|| format!("Failed to delete {}", site.dest_dir.display()))?;
        tracing::info!("Deleted: {}", site.dest_dir.display());
    }

    let Some(parent) = site.dest_dir.parent() else {
        return Ok(());
    };
    let Ok(entries) = fs::read_dir(parent) else {
        return Ok(());
    };
    for entry in entries.filter_map(|e| e.ok()) {
        if entry.file_name().to_string_lossy().starts_with(STAGING_PREFIX) {
            fs::remove_dir_all(entry.path())?;
            tracing::info!("Deleted: {}", entry.path().display());
        }
    }

    Ok(())
}
