//! Build plugins
//!
//! Plugins are compiled in and enabled by name from the `plugins` list of
//! `_config.yml`. Each one implements a subset of the [`Plugin`] hooks.

mod feed;
mod paginate;
mod seo;

use chrono::{DateTime, FixedOffset};

use crate::config::SiteConfig;
use crate::generator::RenderedPost;
use crate::paginate::{single_page, Pager};

pub use feed::FeedPlugin;
pub use paginate::PaginatePlugin;
pub use seo::SeoPlugin;

/// A file produced by a plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOutput {
    /// Output path relative to the destination
    pub path: String,
    pub body: String,
}

/// What kind of page metadata is injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Post,
    Page,
    Index,
    Archive,
}

/// Facts about a rendered page that plugins may describe in its `<head>`
#[derive(Debug, Clone)]
pub struct PageMeta<'a> {
    pub kind: PageKind,
    /// Full document title
    pub title: &'a str,
    pub description: &'a str,
    /// Site-relative URL
    pub url: &'a str,
    pub date: Option<&'a DateTime<FixedOffset>>,
}

/// Build hooks; every hook defaults to doing nothing
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    /// Partition the ordered posts into index pages
    ///
    /// `None` leaves pagination to another plugin (or a single page).
    fn paginate<'a>(
        &self,
        _posts: &'a [RenderedPost],
        _config: &SiteConfig,
    ) -> Option<Vec<Pager<'a, RenderedPost>>> {
        None
    }

    /// Produce a feed document from the ordered posts
    fn generate_feed(&self, _posts: &[RenderedPost], _config: &SiteConfig) -> Option<PluginOutput> {
        None
    }

    /// HTML to place in the page `<head>`
    fn inject_metadata(&self, _page: &PageMeta<'_>, _config: &SiteConfig) -> Option<String> {
        None
    }
}

/// The plugins enabled for a build, in configuration order
pub struct PluginSet {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginSet {
    /// Enable plugins by their configured names
    ///
    /// Unknown names are skipped with a warning.
    pub fn from_names(names: &[String]) -> Self {
        let mut plugins: Vec<Box<dyn Plugin>> = Vec::new();

        for name in names {
            let plugin: Box<dyn Plugin> = match name.trim() {
                "jekyll-paginate-v2" | "jekyll-paginate" => Box::new(PaginatePlugin),
                "jekyll-feed" => Box::new(FeedPlugin),
                "jekyll-seo-tag" => Box::new(SeoPlugin),
                other => {
                    tracing::warn!("Unknown plugin {:?}, ignoring", other);
                    continue;
                }
            };

            if plugins.iter().any(|p| p.name() == plugin.name()) {
                tracing::debug!("Plugin {} listed twice", plugin.name());
                continue;
            }
            plugins.push(plugin);
        }

        Self { plugins }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == name)
    }

    /// Index pages from the first plugin that paginates, otherwise a
    /// single page holding every post
    pub fn paginate<'a>(
        &self,
        posts: &'a [RenderedPost],
        config: &SiteConfig,
    ) -> Vec<Pager<'a, RenderedPost>> {
        self.plugins
            .iter()
            .find_map(|p| p.paginate(posts, config))
            .unwrap_or_else(|| single_page(posts))
    }

    pub fn generate_feeds(&self, posts: &[RenderedPost], config: &SiteConfig) -> Vec<PluginOutput> {
        self.plugins
            .iter()
            .filter_map(|p| p.generate_feed(posts, config))
            .collect()
    }

    /// Concatenated `<head>` metadata from every plugin (empty when none)
    pub fn metadata(&self, page: &PageMeta<'_>, config: &SiteConfig) -> String {
        self.plugins
            .iter()
            .filter_map(|p| p.inject_metadata(page, config))
            .collect()
    }
}
