//! Content loader - loads posts, pages and static files from the site directory

use anyhow::{Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::post::dedup_keep_order;
use super::{FrontMatter, Page, Post, StaticFile};
use crate::error::BuildError;
use crate::helpers::{
    expand_permalink, normalize_url, parse_date, start_of_day, titleize, PermalinkVars,
};
use crate::paginate::sort_posts;
use crate::Site;

lazy_static! {
    /// `YYYY-MM-DD-slug`
    static ref DATED_NAME: Regex = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})-(.+)$").unwrap();
}

/// Everything a build reads from the site directory
#[derive(Debug, Default)]
pub struct SiteContent {
    /// Posts in index order
    pub posts: Vec<Post>,
    pub pages: Vec<Page>,
    pub static_files: Vec<StaticFile>,
}

/// Loads content from the site directory
pub struct ContentLoader<'a> {
    site: &'a Site,
    tz: Tz,
    exclude: Vec<glob::Pattern>,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Result<Self> {
        let config_error = |reason: String| BuildError::Config {
            path: site.config_path.clone(),
            reason,
        };
        let tz = site.config.tz().map_err(config_error)?;
        let exclude = site
            .config
            .exclude
            .iter()
            .map(|p| glob::Pattern::new(p).map_err(|e| config_error(format!("exclude {:?}: {}", p, e))))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self { site, tz, exclude })
    }

    /// Load posts, pages and static files
    pub fn load(&self) -> Result<SiteContent> {
        let posts = self.load_posts()?;
        let (pages, static_files) = self.load_pages()?;
        Ok(SiteContent {
            posts,
            pages,
            static_files,
        })
    }

    /// Load all posts from the posts directory, sorted for the index
    pub fn load_posts(&self) -> Result<Vec<Post>> {
        let posts_dir = &self.site.posts_dir;
        if !posts_dir.exists() {
            tracing::debug!("No posts directory at {:?}", posts_dir);
            return Ok(Vec::new());
        }

        let mut posts = Vec::new();
        let mut slugs: HashMap<String, PathBuf> = HashMap::new();

        for entry in WalkDir::new(posts_dir).follow_links(true).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to read {:?}", posts_dir))?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            if !self.is_markdown_file(path) {
                tracing::debug!("Ignoring non-markdown file in posts: {:?}", path);
                continue;
            }

            let Some(post) = self.load_post(path)? else {
                continue;
            };

            if let Some(first) = slugs.get(&post.slug) {
                return Err(BuildError::DuplicateSlug {
                    slug: post.slug.clone(),
                    first: first.clone(),
                    second: post.source.clone(),
                }
                .into());
            }
            slugs.insert(post.slug.clone(), post.source.clone());
            posts.push(post);
        }

        let pagination = &self.site.config.pagination;
        sort_posts(&mut posts, pagination.sort_field, pagination.sort_reverse);

        Ok(posts)
    }

    /// Load a single post; `None` when it is unpublished
    fn load_post(&self, path: &Path) -> Result<Option<Post>> {
        let source = self.relative(path);
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let (fm, body) = FrontMatter::parse(&content).map_err(|e| BuildError::FrontMatter {
            path: source.clone(),
            reason: e.to_string(),
        })?;

        if !fm.published {
            tracing::info!("Skipping unpublished post {:?}", source);
            return Ok(None);
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled");
        let (name_date, name_slug) = split_dated_name(stem);

        let name_date = match name_date {
            Some(Some(day)) => Some(day),
            Some(None) => {
                return Err(BuildError::InvalidDate {
                    path: source,
                    value: stem.to_string(),
                }
                .into())
            }
            None => None,
        };

        // Front-matter date is authoritative over the file name
        let date = match (&fm.date, name_date) {
            (Some(value), name_date) => {
                let date = parse_date(value, self.tz).ok_or_else(|| BuildError::InvalidDate {
                    path: source.clone(),
                    value: value.clone(),
                })?;
                if let Some(day) = name_date {
                    if date.date_naive() != day {
                        tracing::debug!(
                            "{:?}: front-matter date {} overrides file name date {}",
                            source,
                            date.date_naive(),
                            day
                        );
                    }
                }
                date
            }
            (None, Some(day)) => {
                start_of_day(day, self.tz).ok_or_else(|| BuildError::InvalidDate {
                    path: source.clone(),
                    value: day.to_string(),
                })?
            }
            (None, None) => return Err(BuildError::MissingDate { path: source }.into()),
        };

        let slug = fm
            .slug
            .clone()
            .map(|s| slug::slugify(s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| name_slug.to_string());
        let title = fm.title.clone().unwrap_or_else(|| titleize(&slug));
        let categories = dedup_keep_order(fm.categories);
        let tags = dedup_keep_order(fm.tags);

        let pattern = fm.permalink.as_deref().unwrap_or(&self.site.config.permalink);
        let url = expand_permalink(
            pattern,
            &PermalinkVars {
                date: &date,
                slug: &slug,
                categories: &categories,
            },
        );

        Ok(Some(Post {
            title,
            date,
            slug,
            categories,
            tags,
            layout: fm
                .layout
                .unwrap_or_else(|| self.site.config.default_layout.clone()),
            description: fm.description,
            url,
            body: body.to_string(),
            source,
            extra: fm.extra,
        }))
    }

    /// Walk the site directory for standalone pages and static files
    pub fn load_pages(&self) -> Result<(Vec<Page>, Vec<StaticFile>)> {
        let mut pages = Vec::new();
        let mut static_files = Vec::new();
        let base_dir = &self.site.base_dir;

        let walker = WalkDir::new(base_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_skipped(e));

        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to read {:?}", base_dir))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = self.relative(path);

            if self.is_markdown_file(path) {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {:?}", path))?;
                if FrontMatter::detect(&content) {
                    pages.push(self.load_page(&relative, &content)?);
                    continue;
                }
            }

            static_files.push(StaticFile {
                source: path.to_path_buf(),
                relative,
            });
        }

        Ok((pages, static_files))
    }

    /// Load a standalone page from a file
    fn load_page(&self, relative: &Path, content: &str) -> Result<Page> {
        let (fm, body) = FrontMatter::parse(content).map_err(|e| BuildError::FrontMatter {
            path: relative.to_path_buf(),
            reason: e.to_string(),
        })?;

        let stem = relative
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled");

        let url = match &fm.permalink {
            Some(permalink) => normalize_url(permalink),
            None => {
                // For index.md files, use the parent directory as the path
                let dir = relative
                    .parent()
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                if stem == "index" {
                    normalize_url(&format!("{}/", dir))
                } else {
                    normalize_url(&format!("{}/{}/", dir, stem))
                }
            }
        };

        Ok(Page {
            title: fm.title.unwrap_or_else(|| titleize(stem)),
            layout: fm.layout.unwrap_or_else(|| "page".to_string()),
            description: fm.description,
            url,
            body: body.to_string(),
            source: relative.to_path_buf(),
            extra: fm.extra,
        })
    }

    /// Entries never published: `_`/`.` prefixed, the destination, excluded
    fn is_skipped(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        let path = entry.path();
        if path == self.site.dest_dir
            || path == self.site.posts_dir
            || path == self.site.layouts_dir
        {
            return true;
        }

        let name = entry.file_name().to_string_lossy();
        if name.starts_with('_') || name.starts_with('.') {
            return true;
        }

        let relative = self.relative(path);
        self.exclude
            .iter()
            .any(|p| p.matches_path(&relative) || p.matches(&name))
    }

    fn is_markdown_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.site.config.is_markdown_ext(e))
            .unwrap_or(false)
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.site.base_dir)
            .unwrap_or(path)
            .to_path_buf()
    }
}

/// Split `YYYY-MM-DD-slug` into its date and slug
///
/// The outer `Option` says whether the name has the dated shape, the inner
/// one whether those digits form a real calendar date.
fn split_dated_name(stem: &str) -> (Option<Option<NaiveDate>>, &str) {
    match DATED_NAME.captures(stem) {
        Some(caps) => {
            let num = |i: usize| caps[i].parse::<u32>().unwrap_or(0);
            let date = NaiveDate::from_ymd_opt(num(1) as i32, num(2), num(3));
            let slug = caps.get(4).map_or(stem, |m| m.as_str());
            (Some(date), slug)
        }
        None => (None, stem),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use chrono::Datelike;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn site(dir: &Path) -> Site {
        let mut config = SiteConfig::default();
        config.permalink = "/:title/:year-:month-:day".to_string();
        Site::with_config(dir, config)
    }

    #[test]
    fn test_split_dated_name() {
        let (date, slug) = split_dated_name("2024-09-16-rust-tips");
        assert_eq!(date, Some(NaiveDate::from_ymd_opt(2024, 9, 16)));
        assert_eq!(slug, "rust-tips");

        assert_eq!(split_dated_name("about"), (None, "about"));
        assert_eq!(split_dated_name("2024-02-30-nope").0, Some(None));
    }

    #[test]
    fn test_load_post_from_dated_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "_posts/2024-09-16-rust-tips.md",
            "---\nlayout: post\ncategories: [rust, rust, tools]\n---\nBody\n",
        );

        let site = site(dir.path());
        let posts = ContentLoader::new(&site).unwrap().load_posts().unwrap();
        assert_eq!(posts.len(), 1);

        let post = &posts[0];
        assert_eq!(post.slug, "rust-tips");
        assert_eq!(post.title, "Rust Tips");
        assert_eq!(post.date.date_naive(), NaiveDate::from_ymd_opt(2024, 9, 16).unwrap());
        assert_eq!(post.categories, vec!["rust", "tools"]);
        assert_eq!(post.url, "/rust-tips/2024-09-16");
        assert_eq!(post.source, PathBuf::from("_posts/2024-09-16-rust-tips.md"));
        assert_eq!(post.body, "Body\n");
    }

    #[test]
    fn test_front_matter_date_wins_over_file_name() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "_posts/2024-09-16-curated.md",
            "---\ntitle: Curated\ndate: 2024-09-09\n---\nBody\n",
        );

        let site = site(dir.path());
        let posts = ContentLoader::new(&site).unwrap().load_posts().unwrap();
        assert_eq!(posts[0].date.day(), 9);
        assert_eq!(posts[0].url, "/curated/2024-09-09");
    }

    #[test]
    fn test_undated_post_uses_front_matter() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "_posts/notes.md",
            "---\ntitle: Notes\ndate: 2023-01-02 03:04:05 +0100\n---\n",
        );

        let site = site(dir.path());
        let posts = ContentLoader::new(&site).unwrap().load_posts().unwrap();
        assert_eq!(posts[0].slug, "notes");
        assert_eq!(posts[0].date.to_rfc3339(), "2023-01-02T03:04:05+01:00");
    }

    #[test]
    fn test_missing_date_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "_posts/notes.md", "---\ntitle: Notes\n---\n");

        let site = site(dir.path());
        let err = ContentLoader::new(&site).unwrap().load_posts().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::MissingDate { .. })
        ));
    }

    #[test]
    fn test_invalid_front_matter_date_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "_posts/2024-01-01-a.md",
            "---\ndate: someday\n---\n",
        );

        let site = site(dir.path());
        let err = ContentLoader::new(&site).unwrap().load_posts().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_malformed_front_matter_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "_posts/2024-01-01-ok.md", "---\ntitle: Ok\n---\n");
        write(dir.path(), "_posts/2024-01-02-broken.md", "no front matter here\n");

        let site = site(dir.path());
        let err = ContentLoader::new(&site).unwrap().load_posts().unwrap_err();
        match err.downcast_ref::<BuildError>() {
            Some(BuildError::FrontMatter { path, .. }) => {
                assert_eq!(path, &PathBuf::from("_posts/2024-01-02-broken.md"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_slug_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "_posts/2024-01-01-same.md", "---\n---\n");
        write(dir.path(), "_posts/2024-02-01-same.md", "---\n---\n");

        let site = site(dir.path());
        let err = ContentLoader::new(&site).unwrap().load_posts().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::DuplicateSlug { slug, .. }) if slug == "same"
        ));
    }

    #[test]
    fn test_duplicate_dates_are_allowed_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "_posts/2024-01-01-b.md", "---\n---\n");
        write(dir.path(), "_posts/2024-01-01-a.md", "---\n---\n");
        write(dir.path(), "_posts/2024-03-01-c.md", "---\n---\n");

        let site = site(dir.path());
        let posts = ContentLoader::new(&site).unwrap().load_posts().unwrap();
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_unpublished_posts_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "_posts/2024-01-01-draft.md", "---\npublished: false\n---\n");
        write(dir.path(), "_posts/2024-01-02-live.md", "---\n---\n");
        write(dir.path(), "_posts/image.png", "not markdown");

        let site = site(dir.path());
        let posts = ContentLoader::new(&site).unwrap().load_posts().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "live");
    }

    #[test]
    fn test_load_pages_and_static_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "about.md", "---\ntitle: About\n---\nHi\n");
        write(dir.path(), "docs/index.md", "---\n---\nDocs\n");
        write(dir.path(), "README.md", "# Plain readme\n");
        write(dir.path(), "css/site.css", "body {}");
        write(dir.path(), "Gemfile", "source 'x'");
        write(dir.path(), "_config.yml", "title: x");
        write(dir.path(), "_site/old.html", "old");
        write(dir.path(), ".git/HEAD", "ref");

        let site = site(dir.path());
        let (pages, static_files) = ContentLoader::new(&site).unwrap().load_pages().unwrap();

        let urls: Vec<_> = pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["/about/", "/docs/"]);
        assert_eq!(pages[0].title, "About");
        assert_eq!(pages[1].title, "Index");

        let copied: Vec<_> = static_files.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(
            copied,
            vec![PathBuf::from("README.md"), PathBuf::from("css/site.css")]
        );
    }
}
