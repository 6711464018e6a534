//! blogsmith: a static blog generator
//!
//! Markdown posts with YAML front matter go through a fixed pipeline:
//! the content loader, the renderer (Markdown, syntax highlighting and Tera
//! layouts), the paginator and indexer, then an atomic publish of the whole
//! output tree. Feeds, pagination and SEO metadata are built-in plugins
//! enabled from `_config.yml`.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod paginate;
pub mod plugins;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

pub use error::BuildError;

/// Name of the configuration file at the site root
pub const CONFIG_FILE: &str = "_config.yml";

/// A site on disk and its configuration
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Site root directory
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
    pub posts_dir: PathBuf,
    pub layouts_dir: PathBuf,
    /// Output directory
    pub dest_dir: PathBuf,
}

impl Site {
    /// Open the site in `base_dir`, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE, base_dir.display());
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// A site with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();

        Self {
            config_path: base_dir.join(CONFIG_FILE),
            posts_dir: base_dir.join(&config.posts_dir),
            layouts_dir: base_dir.join(&config.layouts_dir),
            dest_dir: base_dir.join(&config.destination),
            config,
            base_dir,
        }
    }

    /// Build and publish the site
    pub fn build(&self) -> Result<()> {
        commands::build::run(self)
    }

    /// Remove the published site
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new post
    pub fn new_post(&self, title: &str) -> Result<PathBuf> {
        commands::new::run(self, title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_means_defaults() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.config.title, "My Blog");
        assert_eq!(site.dest_dir, dir.path().join("_site"));
        assert_eq!(site.posts_dir, dir.path().join("_posts"));
    }

    #[test]
    fn test_directories_follow_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "destination: public\nposts_dir: articles\n",
        )
        .unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.dest_dir, dir.path().join("public"));
        assert_eq!(site.posts_dir, dir.path().join("articles"));
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "pagination: [not, a, map]\n").unwrap();
        let err = Site::new(dir.path()).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE));
    }
}
