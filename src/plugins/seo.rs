//! Search engine metadata (`jekyll-seo-tag`)

use serde_json::json;

use super::{PageKind, PageMeta, Plugin};
use crate::config::SiteConfig;
use crate::helpers::{absolute_url, date_xml, escape_html};

pub struct SeoPlugin;

impl Plugin for SeoPlugin {
    fn name(&self) -> &'static str {
        "seo"
    }

    fn inject_metadata(&self, page: &PageMeta<'_>, config: &SiteConfig) -> Option<String> {
        Some(seo_tag(page, config))
    }
}

fn seo_tag(page: &PageMeta<'_>, config: &SiteConfig) -> String {
    let canonical = absolute_url(config, page.url);
    let description = if page.description.is_empty() {
        config.description.as_str()
    } else {
        page.description
    };

    let mut tags = vec![
        format!("<title>{}</title>", escape_html(page.title)),
        meta("property", "og:title", page.title),
        meta("property", "og:locale", &config.lang),
    ];
    if !config.author.is_empty() {
        tags.push(meta("name", "author", &config.author));
    }
    if !description.is_empty() {
        tags.push(meta("name", "description", description));
        tags.push(meta("property", "og:description", description));
    }
    tags.push(format!(r#"<link rel="canonical" href="{}">"#, escape_html(&canonical)));
    tags.push(meta("property", "og:url", &canonical));
    tags.push(meta("property", "og:site_name", &config.title));

    let schema_type = match page.kind {
        PageKind::Post => "BlogPosting",
        PageKind::Index => "WebSite",
        PageKind::Page | PageKind::Archive => "WebPage",
    };
    let mut schema = json!({
        "@context": "https://schema.org",
        "@type": schema_type,
        "headline": page.title,
        "url": canonical,
    });

    match (page.kind, page.date) {
        (PageKind::Post, Some(date)) => {
            tags.push(meta("property", "og:type", "article"));
            tags.push(meta("property", "article:published_time", &date_xml(date)));
            schema["datePublished"] = json!(date_xml(date));
        }
        _ => tags.push(meta("property", "og:type", "website")),
    }
    if !description.is_empty() {
        schema["description"] = json!(description);
    }
    if !config.author.is_empty() {
        schema["author"] = json!({ "@type": "Person", "name": config.author });
    }

    // `</script>` inside a string would end the block early
    let schema = schema.to_string().replace("</", "<\\/");
    tags.push(format!(r#"<script type="application/ld+json">{}</script>"#, schema));

    tags.iter().map(|tag| format!("  {}\n", tag)).collect()
}

fn meta(attribute: &str, key: &str, content: &str) -> String {
    format!(
        r#"<meta {}="{}" content="{}">"#,
        attribute,
        key,
        escape_html(content)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::parse_date;
    use chrono_tz::Tz;

    fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.title = "My Blog".to_string();
        config.url = "https://example.com".to_string();
        config.author = "Jane Doe".to_string();
        config
    }

    #[test]
    fn test_post_metadata() {
        let date = parse_date("2024-09-09", Tz::UTC).unwrap();
        let page = PageMeta {
            kind: PageKind::Post,
            title: "Hello \"World\"",
            description: "A first post",
            url: "/2024/09/09/hello.html",
            date: Some(&date),
        };
        let tag = SeoPlugin.inject_metadata(&page, &config()).unwrap();

        assert!(tag.starts_with("  <title>Hello &quot;World&quot;</title>\n"));
        assert!(tag.contains(r#"<meta name="description" content="A first post">"#));
        assert!(tag.contains(
            r#"<link rel="canonical" href="https://example.com/2024/09/09/hello.html">"#
        ));
        assert!(tag.contains(r#"<meta property="og:type" content="article">"#));
        assert!(tag.contains(r#""@type":"BlogPosting""#));
        assert!(tag.contains(r#""datePublished":"2024-09-09T00:00:00+00:00""#));
        assert!(tag.contains(r#""name":"Jane Doe""#));
        assert!(tag.ends_with("</script>\n"));
    }

    #[test]
    fn test_index_falls_back_to_site_description() {
        let mut config = config();
        config.description = "Articles worth reading".to_string();
        let page = PageMeta {
            kind: PageKind::Index,
            title: "My Blog",
            description: "",
            url: "/",
            date: None,
        };
        let tag = seo_tag(&page, &config);
        assert!(tag.contains(r#"content="Articles worth reading""#));
        assert!(tag.contains(r#"<meta property="og:type" content="website">"#));
        assert!(tag.contains(r#""@type":"WebSite""#));
    }

    #[test]
    fn test_script_terminator_is_escaped() {
        let page = PageMeta {
            kind: PageKind::Page,
            title: "</script><b>",
            description: "",
            url: "/x/",
            date: None,
        };
        let tag = seo_tag(&page, &config());
        assert_eq!(tag.matches("</script>").count(), 1);
    }
}
