//! Post, page and static file models

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::PathBuf;

/// A blog post, immutable once loaded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    /// Post title
    pub title: String,

    /// Publication date, the ordering key
    pub date: DateTime<FixedOffset>,

    /// URL-friendly name, unique across the site
    pub slug: String,

    /// Post categories, duplicates removed
    pub categories: Vec<String>,

    /// Post tags, duplicates removed
    pub tags: Vec<String>,

    /// Layout template to use
    pub layout: String,

    /// Summary from front matter
    pub description: Option<String>,

    /// Site-relative URL, starts with `/`
    pub url: String,

    /// Raw markdown body
    pub body: String,

    /// Source file path, relative to the site directory
    pub source: PathBuf,

    /// Custom front-matter fields
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// A standalone page such as `about.md`
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub title: String,
    pub layout: String,
    pub description: Option<String>,
    /// Site-relative URL, starts with `/`
    pub url: String,
    /// Raw markdown body
    pub body: String,
    /// Source file path, relative to the site directory
    pub source: PathBuf,
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// A file copied verbatim into the output tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile {
    /// Absolute path of the source file
    pub source: PathBuf,
    /// Output path, relative to the destination
    pub relative: PathBuf,
}

/// Remove duplicates while keeping first occurrences in order
pub(crate) fn dedup_keep_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keep_order() {
        let items = vec![
            "rust".to_string(),
            "web".to_string(),
            "rust".to_string(),
            " ".to_string(),
            "cli".to_string(),
        ];
        assert_eq!(dedup_keep_order(items), vec!["rust", "web", "cli"]);
    }
}
