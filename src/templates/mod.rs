//! Layout templates using the Tera template engine
//!
//! The default layouts are embedded in the binary. Every `*.html` file in
//! the site's layouts directory adds a layout or replaces a built-in one of
//! the same name, so a site can restyle itself without a theme runtime.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tera::{Context, Tera};

use crate::error::BuildError;
use crate::helpers;

const BUILTIN_LAYOUTS: [(&str, &str); 5] = [
    ("base.html", include_str!("layouts/base.html")),
    ("post.html", include_str!("layouts/post.html")),
    ("page.html", include_str!("layouts/page.html")),
    ("index.html", include_str!("layouts/index.html")),
    ("archive.html", include_str!("layouts/archive.html")),
];

/// Template renderer with the built-in layouts and any site overrides
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a renderer with only the built-in layouts
    pub fn new() -> Result<Self, BuildError> {
        Self::with_layouts_dir(None::<&Path>)
    }

    /// Create a renderer, letting `*.html` files in `dir` override layouts
    pub fn with_layouts_dir<P: AsRef<Path>>(dir: Option<P>) -> Result<Self, BuildError> {
        let mut tera = Tera::default();

        // Layouts produce HTML and embed rendered HTML; escaping is explicit
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(BUILTIN_LAYOUTS.to_vec())
            .map_err(|e| load_error("built-in layouts", &e))?;

        if let Some(dir) = dir {
            let overrides = layout_files(dir.as_ref());
            if !overrides.is_empty() {
                tracing::debug!(
                    "Loading {} layouts from {}",
                    overrides.len(),
                    dir.as_ref().display()
                );
                tera.add_template_files(overrides)
                    .map_err(|e| load_error(&dir.as_ref().display().to_string(), &e))?;
            }
        }

        tera.register_filter("escape_attr", escape_attr_filter);
        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Whether a layout of this name (`post` or `post.html`) exists
    pub fn has_layout(&self, layout: &str) -> bool {
        let name = layout_template(layout);
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Render `layout` for the output `target`
    ///
    /// A missing layout or a variable absent from `context` fails the
    /// build; the error names both the target and the template.
    pub fn render(&self, layout: &str, context: &Context, target: &str) -> Result<String, BuildError> {
        let template = layout_template(layout);
        if !self.has_layout(&template) {
            return Err(BuildError::Template {
                template,
                target: target.to_string(),
                reason: "layout not found".to_string(),
            });
        }

        self.tera
            .render(&template, context)
            .map_err(|e| BuildError::Template {
                template: template.clone(),
                target: target.to_string(),
                reason: error_chain(&e),
            })
    }
}

/// Template file name for a layout (`post` -> `post.html`)
pub fn layout_template(layout: &str) -> String {
    if layout.ends_with(".html") {
        layout.to_string()
    } else {
        format!("{}.html", layout)
    }
}

fn layout_files(dir: &Path) -> Vec<(std::path::PathBuf, Option<String>)> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut files: Vec<_> = walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "html"))
        .filter_map(|e| {
            let name = e
                .path()
                .strip_prefix(dir)
                .ok()?
                .to_string_lossy()
                .replace('\\', "/");
            Some((e.path().to_path_buf(), Some(name)))
        })
        .collect();
    files.sort();
    files
}

fn load_error(source: &str, err: &tera::Error) -> BuildError {
    BuildError::Template {
        template: source.to_string(),
        target: "layouts".to_string(),
        reason: error_chain(err),
    }
}

/// Tera wraps the useful message (the missing variable, the bad line) in
/// its error source chain
fn error_chain(err: &tera::Error) -> String {
    let mut reason = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = cause.source();
    }
    reason
}

/// Tera filter: escape a value for a quoted attribute, leaving `/` alone
fn escape_attr_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("escape_attr", "value", String, value);
    Ok(tera::Value::String(helpers::escape_html(&s)))
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(helpers::strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 160,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    Ok(tera::Value::String(helpers::truncate_chars(&s, length, &omission)))
}

/// Tera filter: reformat an RFC 3339 date with a strftime pattern
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "%Y-%m-%d".to_string(),
    };

    match chrono::DateTime::parse_from_rfc3339(&s) {
        Ok(date) => helpers::format_date(&date, &format)
            .map(tera::Value::String)
            .map_err(tera::Error::msg),
        Err(_) => Ok(tera::Value::String(s)),
    }
}

// Template context data

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub lang: String,
    pub url: String,
    pub baseurl: String,
    /// URL of the first index page, baseurl included
    pub home_url: String,
    pub feed_url: Option<String>,
    pub categories: Vec<TermData>,
    pub tags: Vec<TermData>,
}

/// A category or tag with its archive page
#[derive(Debug, Clone, Serialize)]
pub struct TermData {
    pub name: String,
    pub url: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkData {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub title: String,
    pub slug: String,
    /// RFC 3339
    pub date: String,
    /// `date` formatted with the site's `date_format`
    pub date_display: String,
    pub url: String,
    pub absolute_url: String,
    pub categories: Vec<LinkData>,
    pub tags: Vec<LinkData>,
    pub content: String,
    pub excerpt: String,
    pub description: String,
    pub extra: IndexMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavPost {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageData {
    pub title: String,
    pub url: String,
    pub absolute_url: String,
    pub content: String,
    pub description: String,
    pub extra: IndexMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationData {
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub total_posts: usize,
    pub previous_page_path: Option<String>,
    pub next_page_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveData {
    /// `category` or `tag`
    pub kind: String,
    pub name: String,
    pub url: String,
    pub posts: Vec<PostData>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site_data() -> SiteData {
        SiteData {
            title: "Test & Blog".to_string(),
            description: String::new(),
            author: "Jane".to_string(),
            lang: "en".to_string(),
            url: "https://example.com".to_string(),
            baseurl: String::new(),
            home_url: "/".to_string(),
            feed_url: Some("/feed.xml".to_string()),
            categories: Vec::new(),
            tags: Vec::new(),
        }
    }

    fn post_data() -> PostData {
        PostData {
            title: "Hello".to_string(),
            slug: "hello".to_string(),
            date: "2024-09-09T00:00:00+00:00".to_string(),
            date_display: "Sep 9, 2024".to_string(),
            url: "/2024/09/09/hello.html".to_string(),
            absolute_url: "https://example.com/2024/09/09/hello.html".to_string(),
            categories: vec![LinkData {
                name: "rust".to_string(),
                url: "/categories/rust/".to_string(),
            }],
            tags: Vec::new(),
            content: "<p>Body</p>".to_string(),
            excerpt: "<p>Body</p>".to_string(),
            description: "Body".to_string(),
            extra: IndexMap::new(),
        }
    }

    fn post_context() -> Context {
        let mut context = Context::new();
        context.insert("site", &site_data());
        context.insert("page_title", "Hello");
        context.insert("seo_tag", "");
        context.insert("post", &post_data());
        context.insert("previous", &None::<NavPost>);
        context.insert(
            "next",
            &Some(NavPost {
                title: "Newer".to_string(),
                url: "/newer/".to_string(),
            }),
        );
        context
    }

    #[test]
    fn test_render_builtin_post() {
        let renderer = TemplateRenderer::new().unwrap();
        let html = renderer.render("post", &post_context(), "hello.html").unwrap();
        assert!(html.contains("<title>Hello</title>"));
        assert!(html.contains("Test &amp; Blog"));
        assert!(html.contains("<p>Body</p>"));
        assert!(html.contains(r#"href="/categories/rust/""#));
        assert!(html.contains(r#"<a class="next" href="/newer/">"#));
        assert!(!html.contains(r#"class="previous""#));
        assert!(html.contains(r#"href="/feed.xml""#));
    }

    #[test]
    fn test_link_attributes_are_escaped() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut site = site_data();
        site.home_url = r#"/blog/"onclick="x"#.to_string();
        site.feed_url = Some("/feed.xml?a=1&b=2".to_string());
        let mut context = post_context();
        context.insert("site", &site);

        let html = renderer.render("post", &context, "hello.html").unwrap();
        assert!(html.contains(r#"href="/blog/&quot;onclick=&quot;x""#));
        assert!(html.contains(r#"href="/feed.xml?a=1&amp;b=2""#));
    }

    #[test]
    fn test_unknown_layout_is_fatal() {
        let renderer = TemplateRenderer::new().unwrap();
        let err = renderer
            .render("gallery", &post_context(), "hello.html")
            .unwrap_err();
        assert!(matches!(err, BuildError::Template { ref template, .. } if template == "gallery.html"));
    }

    #[test]
    fn test_user_layout_overrides_builtin() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("post.html"),
            r#"{% extends "base.html" %}{% block content %}CUSTOM {{ post.title }}{% endblock content %}"#,
        )
        .unwrap();
        fs::write(dir.path().join("note.html"), "NOTE {{ post.slug }}").unwrap();

        let renderer = TemplateRenderer::with_layouts_dir(Some(dir.path())).unwrap();
        let html = renderer.render("post", &post_context(), "hello.html").unwrap();
        assert!(html.contains("CUSTOM Hello"));
        assert!(html.contains("<title>Hello</title>"));

        assert!(renderer.has_layout("note"));
        let note = renderer.render("note", &post_context(), "hello.html").unwrap();
        assert_eq!(note, "NOTE hello");
    }

    #[test]
    fn test_undefined_variable_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("post.html"), "{{ post.title }} {{ author_bio }}").unwrap();

        let renderer = TemplateRenderer::with_layouts_dir(Some(dir.path())).unwrap();
        let err = renderer
            .render("post", &post_context(), "2024/09/09/hello.html")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("2024/09/09/hello.html"));
        assert!(message.contains("post.html"));
        assert!(message.contains("author_bio"));
    }

    #[test]
    fn test_broken_user_layout_fails_to_load() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("post.html"), "{% if %}").unwrap();
        assert!(TemplateRenderer::with_layouts_dir(Some(dir.path())).is_err());
    }

    #[test]
    fn test_filters() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("filters.html"),
            r#"{{ post.content | strip_html }}|{{ "abcdefgh" | truncate_chars(length=3) }}|{{ post.date | date_format(format="%Y/%m/%d") }}"#,
        )
        .unwrap();

        let renderer = TemplateRenderer::with_layouts_dir(Some(dir.path())).unwrap();
        let out = renderer.render("filters", &post_context(), "x").unwrap();
        assert_eq!(out, "Body|abc...|2024/09/09");
    }

    #[test]
    fn test_bad_date_format_filter_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("dates.html"),
            r#"{{ post.date | date_format(format="%Q") }}"#,
        )
        .unwrap();

        let renderer = TemplateRenderer::with_layouts_dir(Some(dir.path())).unwrap();
        let err = renderer
            .render("dates", &post_context(), "2024/09/09/hello.html")
            .unwrap_err();
        assert!(matches!(err, BuildError::Template { ref target, .. } if target == "2024/09/09/hello.html"));
    }

    #[test]
    fn test_layout_template_name() {
        assert_eq!(layout_template("post"), "post.html");
        assert_eq!(layout_template("post.html"), "post.html");
    }
}
