//! Create a new post

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::PathBuf;

use crate::Site;

/// Create `_posts/YYYY-MM-DD-slug.md` dated now in the site timezone
pub fn run(site: &Site, title: &str) -> Result<PathBuf> {
    let tz = site
        .config
        .tz()
        .map_err(|reason| anyhow::anyhow!("{}: {}", site.config_path.display(), reason))?;
    let now = Utc::now().with_timezone(&tz);

    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a file name from title {:?}", title);
    }

    fs::create_dir_all(&site.posts_dir)
        .with_context(|| format!("Failed to create {}", site.posts_dir.display()))?;
    let file_path = site
        .posts_dir
        .join(format!("{}-{}.md", now.format("%Y-%m-%d"), slug));

    if file_path.exists() {
        anyhow::bail!("File already exists: {}", file_path.display());
    }

    let content = format!(
        "---\nlayout: {}\ntitle: {}\ndate: {}\ncategories: []\ntags: []\n---\n",
        site.config.default_layout,
        serde_yaml::to_string(title)?.trim_end(),
        now.format("%Y-%m-%d %H:%M:%S %z"),
    );
    fs::write(&file_path, content)
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    tracing::info!("Created: {}", file_path.display());
    Ok(file_path)
}
