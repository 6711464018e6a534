//! URL and permalink helpers

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use std::path::PathBuf;

use crate::config::SiteConfig;

/// Prefix a site-relative path with `baseurl`
///
/// # Examples
/// ```ignore
/// url_for(&config, "/css/style.css") // -> "/blog/css/style.css"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.baseurl.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    format!("{}/{}", base, path)
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// absolute_url(&config, "/about/") // -> "https://example.com/blog/about/"
/// ```
pub fn absolute_url(config: &SiteConfig, path: &str) -> String {
    format!("{}{}", config.url.trim_end_matches('/'), url_for(config, path))
}

/// Values a permalink pattern can refer to
pub struct PermalinkVars<'a> {
    pub date: &'a DateTime<FixedOffset>,
    pub slug: &'a str,
    pub categories: &'a [String],
}

/// Expand a permalink pattern (or one of the `date`, `pretty`, `ordinal`,
/// `none` presets) into a site-relative URL starting with `/`
pub fn expand_permalink(pattern: &str, vars: &PermalinkVars<'_>) -> String {
    let pattern = match pattern {
        "date" => "/:categories/:year/:month/:day/:title:output_ext",
        "pretty" => "/:categories/:year/:month/:day/:title/",
        "ordinal" => "/:categories/:year/:y_day/:title:output_ext",
        "none" => "/:categories/:title:output_ext",
        other => other,
    };

    let date = vars.date;
    let categories = vars
        .categories
        .iter()
        .map(|c| slug::slugify(c))
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    // Longer names first so `:title` never eats part of another token
    let replacements = [
        (":output_ext", ".html".to_string()),
        (":categories", categories),
        (":short_year", format!("{:02}", date.year() % 100)),
        (":i_month", date.month().to_string()),
        (":i_day", date.day().to_string()),
        (":y_day", format!("{:03}", date.ordinal())),
        (":minute", format!("{:02}", date.minute())),
        (":second", format!("{:02}", date.second())),
        (":month", format!("{:02}", date.month())),
        (":title", vars.slug.to_string()),
        (":year", format!("{:04}", date.year())),
        (":hour", format!("{:02}", date.hour())),
        (":slug", vars.slug.to_string()),
        (":day", format!("{:02}", date.day())),
    ];

    let mut url = pattern.to_string();
    for (token, value) in &replacements {
        url = url.replace(token, value);
    }

    normalize_url(&url)
}

/// Collapse repeated slashes and ensure a leading `/`
pub fn normalize_url(url: &str) -> String {
    let mut normalized = String::with_capacity(url.len() + 1);
    normalized.push('/');
    for c in url.chars() {
        if c == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(c);
    }
    normalized
}

/// Output file for a site-relative URL
///
/// A trailing slash maps to `index.html`, a URL with an extension is kept,
/// anything else gets `.html` appended.
pub fn url_to_output_path(url: &str) -> PathBuf {
    let trimmed = url.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.ends_with('/') {
        return PathBuf::from(trimmed).join("index.html");
    }

    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    if last.contains('.') {
        PathBuf::from(trimmed)
    } else {
        PathBuf::from(format!("{}.html", trimmed))
    }
}

/// Title-case a slug: `hello-world` -> `Hello World`
pub fn titleize(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
