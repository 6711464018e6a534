//! Build the site: load, render, publish

use anyhow::Result;
use std::time::Instant;

use crate::content::ContentLoader;
use crate::generator::Generator;
use crate::Site;

/// Run the whole pipeline and publish into the destination directory
///
/// Nothing under the destination changes unless every stage succeeds.
pub fn run(site: &Site) -> Result<()> {
    let start = Instant::now();

    let content = ContentLoader::new(site)?.load()?;
    tracing::info!(
        "Loaded {} posts, {} pages and {} static files in {:.2}s",
        content.posts.len(),
        content.pages.len(),
        content.static_files.len(),
        start.elapsed().as_secs_f64()
    );

    let rendered_at = Instant::now();
    let output = Generator::new(site)?.generate(content)?;
    tracing::info!(
        "Rendered {} files in {:.2}s",
        output.len(),
        rendered_at.elapsed().as_secs_f64()
    );

    output.publish(&site.dest_dir)?;
    tracing::info!(
        "Published to {} in {:.2}s",
        site.dest_dir.display(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
