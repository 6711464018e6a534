//! Site configuration (_config.yml)

use anyhow::Result;
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use crate::error::BuildError;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub lang: String,
    /// IANA timezone name used for dates written without an offset
    pub timezone: Option<String>,

    // URL
    pub url: String,
    pub baseurl: String,
    pub permalink: String,

    // Directory
    pub posts_dir: String,
    pub layouts_dir: String,
    pub destination: String,
    pub category_dir: String,
    pub tag_dir: String,
    pub exclude: Vec<String>,
    pub markdown_ext: Vec<String>,

    // Writing
    pub default_layout: String,
    pub excerpt_separator: String,
    /// strftime pattern for human readable dates
    pub date_format: String,
    pub highlight: HighlightConfig,

    // Index, feed and plugins
    pub pagination: PaginationConfig,
    pub feed: FeedConfig,
    pub plugins: Vec<String>,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            description: String::new(),
            author: String::new(),
            lang: "en".to_string(),
            timezone: None,

            url: "http://localhost:4000".to_string(),
            baseurl: String::new(),
            permalink: "date".to_string(),

            posts_dir: "_posts".to_string(),
            layouts_dir: "_layouts".to_string(),
            destination: "_site".to_string(),
            category_dir: "categories".to_string(),
            tag_dir: "tags".to_string(),
            exclude: vec![
                "Gemfile".to_string(),
                "Gemfile.lock".to_string(),
                "node_modules".to_string(),
                "vendor".to_string(),
            ],
            markdown_ext: vec!["md".to_string(), "markdown".to_string()],

            default_layout: "post".to_string(),
            excerpt_separator: "\n\n".to_string(),
            date_format: "%b %-d, %Y".to_string(),
            highlight: HighlightConfig::default(),

            pagination: PaginationConfig::default(),
            feed: FeedConfig::default(),
            plugins: vec!["jekyll-feed".to_string(), "jekyll-paginate-v2".to_string()],

            extra: IndexMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_error = |reason: String| BuildError::Config {
            path: path.to_path_buf(),
            reason,
        };

        let content = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        let config: SiteConfig = if content.trim().is_empty() {
            SiteConfig::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| config_error(e.to_string()))?
        };
        config.validate().map_err(config_error)?;

        Ok(config)
    }

    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.pagination.per_page == 0 {
            return Err("pagination.per_page must be at least 1".to_string());
        }
        self.tz()?;
        crate::helpers::check_date_format(&self.date_format)?;
        Ok(())
    }

    /// Timezone for dates without an explicit offset (UTC when unset)
    pub fn tz(&self) -> std::result::Result<Tz, String> {
        match self.timezone.as_deref() {
            None | Some("") => Ok(Tz::UTC),
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| format!("unknown timezone {:?}", name)),
        }
    }

    /// Whether a file extension marks a Markdown source
    pub fn is_markdown_ext(&self, ext: &str) -> bool {
        self.markdown_ext
            .iter()
            .any(|m| m.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// syntect theme name
    pub theme: String,
    pub line_numbers: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_numbers: false,
        }
    }
}

/// Field posts are ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Date,
    Title,
}

/// Index pagination (`pagination:` block)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub enabled: bool,
    pub per_page: usize,
    /// URL pattern for pages 2.., `:num` is the page number
    pub permalink: String,
    /// Suffix appended to the site title on pages 2..
    pub title: String,
    /// Maximum number of index pages
    pub limit: Limit,
    pub sort_field: SortField,
    /// `true` sorts descending (newest first for dates)
    pub sort_reverse: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_page: 10,
            permalink: "/page/:num/".to_string(),
            title: " - page :num".to_string(),
            limit: Limit::unlimited(),
            sort_field: SortField::Date,
            sort_reverse: true,
        }
    }
}

/// Atom feed (`feed:` block)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub path: String,
    /// Maximum number of entries
    pub limit: Limit,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            path: "feed.xml".to_string(),
            limit: Limit::unlimited(),
        }
    }
}

/// A count cap where `0` in the configuration means "no cap"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "usize", into = "usize")]
pub struct Limit(Option<NonZeroUsize>);

impl Limit {
    pub fn unlimited() -> Self {
        Self(None)
    }

    pub fn at_most(n: usize) -> Self {
        Self(NonZeroUsize::new(n))
    }

    pub fn is_unlimited(&self) -> bool {
        self.0.is_none()
    }

    /// Cap a length by this limit
    pub fn cap(&self, len: usize) -> usize {
        match self.0 {
            Some(n) => len.min(n.get()),
            None => len,
        }
    }

    /// The leading items allowed by this limit
    pub fn apply<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.cap(items.len())]
    }
}

impl From<usize> for Limit {
    fn from(n: usize) -> Self {
        Self::at_most(n)
    }
}

impl From<Limit> for usize {
    fn from(limit: Limit) -> Self {
        limit.0.map_or(0, NonZeroUsize::get)
    }
}
