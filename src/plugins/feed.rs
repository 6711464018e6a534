//! Atom feed (`jekyll-feed`)

use super::{Plugin, PluginOutput};
use crate::config::SiteConfig;
use crate::generator::RenderedPost;
use crate::helpers::{
    absolute_url, absolutize_urls, date_xml, escape_xml, strip_invalid_xml_chars,
};
use crate::paginate::feed_entries;

pub struct FeedPlugin;

impl Plugin for FeedPlugin {
    fn name(&self) -> &'static str {
        "feed"
    }

    fn generate_feed(&self, posts: &[RenderedPost], config: &SiteConfig) -> Option<PluginOutput> {
        Some(PluginOutput {
            path: config.feed.path.trim_start_matches('/').to_string(),
            body: atom_feed(posts, config),
        })
    }
}

/// Render an Atom document of the most recent posts
///
/// Entries are newest first whatever the index order is. `<updated>` is the
/// newest entry date, or the epoch for an empty feed.
fn atom_feed(posts: &[RenderedPost], config: &SiteConfig) -> String {
    let mut recent: Vec<&RenderedPost> = posts.iter().collect();
    recent.sort_by(|a, b| {
        b.post
            .date
            .cmp(&a.post.date)
            .then_with(|| a.post.slug.cmp(&b.post.slug))
    });
    let entries = feed_entries(&recent, config.feed.limit);

    let updated = entries
        .first()
        .map(|p| date_xml(&p.post.date))
        .unwrap_or_else(|| chrono::DateTime::<chrono::Utc>::UNIX_EPOCH.to_rfc3339());
    let feed_url = absolute_url(config, &config.feed.path);
    let home_url = absolute_url(config, "/");
    let base_url = config.url.trim_end_matches('/');

    let mut feed = String::new();
    feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    feed.push('\n');
    feed.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
    feed.push('\n');
    feed.push_str(&format!(
        "  <link href=\"{}\" rel=\"self\" type=\"application/atom+xml\"/>\n",
        escape_xml(&feed_url)
    ));
    feed.push_str(&format!(
        "  <link href=\"{}\" rel=\"alternate\" type=\"text/html\"/>\n",
        escape_xml(&home_url)
    ));
    feed.push_str(&format!("  <updated>{}</updated>\n", updated));
    feed.push_str(&format!("  <id>{}</id>\n", escape_xml(&feed_url)));
    feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
    if !config.description.is_empty() {
        feed.push_str(&format!(
            "  <subtitle>{}</subtitle>\n",
            escape_xml(&config.description)
        ));
    }
    if !config.author.is_empty() {
        feed.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            escape_xml(&config.author)
        ));
    }

    for entry in entries {
        let post = &entry.post;
        let url = absolute_url(config, &post.url);

        feed.push_str("  <entry>\n");
        feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&post.title)));
        feed.push_str(&format!(
            "    <link href=\"{}\" rel=\"alternate\" type=\"text/html\"/>\n",
            escape_xml(&url)
        ));
        feed.push_str(&format!("    <id>{}</id>\n", escape_xml(&url)));
        feed.push_str(&format!("    <published>{}</published>\n", date_xml(&post.date)));
        feed.push_str(&format!("    <updated>{}</updated>\n", date_xml(&post.date)));
        for category in post.categories.iter().chain(&post.tags) {
            feed.push_str(&format!(
                "    <category term=\"{}\"/>\n",
                escape_xml(category)
            ));
        }
        if !entry.description.is_empty() {
            feed.push_str(&format!(
                "    <summary>{}</summary>\n",
                escape_xml(&strip_invalid_xml_chars(&entry.description))
            ));
        }
        // CDATA cannot contain its own terminator
        let content = absolutize_urls(&entry.content, base_url).replace("]]>", "]]]]><![CDATA[>");
        feed.push_str(&format!(
            "    <content type=\"html\"><![CDATA[{}]]></content>\n",
            strip_invalid_xml_chars(&content)
        ));
        feed.push_str("  </entry>\n");
    }

    feed.push_str("</feed>\n");
    feed
}
