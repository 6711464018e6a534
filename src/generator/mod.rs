//! Generator module - renders loaded content into the output tree

mod output;

pub use output::{OutputBody, SiteOutput, STAGING_PREFIX};

use anyhow::Result;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tera::Context;

use crate::content::{MarkdownRenderer, Page, Post, SiteContent};
use crate::error::BuildError;
use crate::helpers::{
    absolute_url, format_date, normalize_url, squash_whitespace, strip_html, truncate_chars,
    url_for, url_to_output_path,
};
use crate::paginate::{group_by, page_title, page_url};
use crate::plugins::{PageKind, PageMeta, PluginSet};
use crate::templates::{
    ArchiveData, LinkData, NavPost, PageData, PaginationData, PostData, SiteData, TemplateRenderer,
    TermData,
};
use crate::Site;

/// Longest generated description, in characters
const DESCRIPTION_LENGTH: usize = 160;

/// A post with its Markdown rendered to HTML
#[derive(Debug, Clone)]
pub struct RenderedPost {
    pub post: Post,
    pub content: String,
    pub excerpt: String,
    /// Front-matter description, or the excerpt as plain text
    pub description: String,
}

/// Static site generator using Tera templates
pub struct Generator {
    site: Site,
    templates: TemplateRenderer,
    markdown: MarkdownRenderer,
    plugins: PluginSet,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site) -> Result<Self> {
        site.config.validate().map_err(|reason| BuildError::Config {
            path: site.config_path.clone(),
            reason,
        })?;
        let templates = TemplateRenderer::with_layouts_dir(Some(&site.layouts_dir))?;
        let markdown = MarkdownRenderer::with_options(&site.config.highlight);
        let plugins = PluginSet::from_names(&site.config.plugins);
        tracing::debug!("Enabled plugins: {:?}", plugins.names());

        Ok(Self {
            site: site.clone(),
            templates,
            markdown,
            plugins,
        })
    }

    /// Render the loaded content into an in-memory output tree
    pub fn generate(&self, content: SiteContent) -> Result<SiteOutput> {
        let SiteContent {
            posts,
            pages,
            static_files,
        } = content;

        let posts = self.render_posts(posts);
        let site_data = self.site_data(&posts);
        let mut output = SiteOutput::new();

        self.generate_post_pages(&posts, &site_data, &mut output)?;
        self.generate_standalone_pages(&pages, &site_data, &mut output)?;
        self.generate_index_pages(&posts, &site_data, &mut output)?;
        self.generate_archive_pages(&posts, &site_data, &mut output)?;

        for feed in self.plugins.generate_feeds(&posts, &self.site.config) {
            output.insert(PathBuf::from(&feed.path), "feed", OutputBody::Rendered(feed.body))?;
        }

        for file in static_files {
            let origin = file.relative.display().to_string();
            output.insert(file.relative, origin, OutputBody::Copy(file.source))?;
        }

        Ok(output)
    }

    /// Render post bodies and excerpts in parallel, keeping collection order
    pub fn render_posts(&self, posts: Vec<Post>) -> Vec<RenderedPost> {
        let separator = &self.site.config.excerpt_separator;

        posts
            .into_par_iter()
            .map(|post| {
                let content = self.markdown.render(&post.body);
                let excerpt = self
                    .markdown
                    .render(&MarkdownRenderer::split_excerpt(&post.body, separator));
                let description = match &post.description {
                    Some(d) => d.clone(),
                    None => describe(&excerpt),
                };
                RenderedPost {
                    post,
                    content,
                    excerpt,
                    description,
                }
            })
            .collect()
    }

    fn site_data(&self, posts: &[RenderedPost]) -> SiteData {
        let config = &self.site.config;
        let terms = |dir: &str, groups: BTreeMap<&str, Vec<&RenderedPost>>| -> Vec<TermData> {
            groups
                .into_iter()
                .map(|(name, members)| TermData {
                    name: name.to_string(),
                    url: url_for(config, &term_url(dir, name)),
                    count: members.len(),
                })
                .collect()
        };

        SiteData {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            lang: config.lang.clone(),
            url: config.url.clone(),
            baseurl: config.baseurl.clone(),
            home_url: url_for(config, "/"),
            feed_url: self
                .plugins
                .is_enabled("feed")
                .then(|| url_for(config, &config.feed.path)),
            categories: terms(
                config.category_dir.as_str(),
                group_by(posts, |p| p.post.categories.as_slice()),
            ),
            tags: terms(config.tag_dir.as_str(), group_by(posts, |p| p.post.tags.as_slice())),
        }
    }

    fn post_data(&self, rendered: &RenderedPost) -> Result<PostData, BuildError> {
        let config = &self.site.config;
        let post = &rendered.post;
        let links = |dir: &str, names: &[String]| -> Vec<LinkData> {
            names
                .iter()
                .map(|name| LinkData {
                    name: name.clone(),
                    url: url_for(config, &term_url(dir, name)),
                })
                .collect()
        };

        let date_display =
            format_date(&post.date, &config.date_format).map_err(|reason| BuildError::Config {
                path: self.site.config_path.clone(),
                reason,
            })?;

        Ok(PostData {
            title: post.title.clone(),
            slug: post.slug.clone(),
            date: post.date.to_rfc3339(),
            date_display,
            url: url_for(config, &post.url),
            absolute_url: absolute_url(config, &post.url),
            categories: links(config.category_dir.as_str(), post.categories.as_slice()),
            tags: links(config.tag_dir.as_str(), post.tags.as_slice()),
            content: rendered.content.clone(),
            excerpt: rendered.excerpt.clone(),
            description: rendered.description.clone(),
            extra: post.extra.clone(),
        })
    }

    /// Context shared by every layout
    fn base_context(&self, site_data: &SiteData, meta: &PageMeta<'_>) -> Context {
        let mut context = Context::new();
        context.insert("site", site_data);
        context.insert("page_title", meta.title);
        context.insert("page_url", &url_for(&self.site.config, meta.url));
        context.insert("seo_tag", &self.plugins.metadata(meta, &self.site.config));
        context
    }

    /// One page per post, with links to the older and newer neighbours
    fn generate_post_pages(
        &self,
        posts: &[RenderedPost],
        site_data: &SiteData,
        output: &mut SiteOutput,
    ) -> Result<()> {
        let config = &self.site.config;

        // Neighbours are chronological whatever the index order is
        let mut chronological: Vec<usize> = (0..posts.len()).collect();
        chronological.sort_by(|&a, &b| {
            let (a, b) = (&posts[a].post, &posts[b].post);
            a.date.cmp(&b.date).then_with(|| a.slug.cmp(&b.slug))
        });
        let mut position = vec![0; posts.len()];
        for (rank, &index) in chronological.iter().enumerate() {
            position[index] = rank;
        }
        let nav = |rank: Option<usize>| {
            rank.and_then(|r| chronological.get(r)).map(|&i| NavPost {
                title: posts[i].post.title.clone(),
                url: url_for(config, &posts[i].post.url),
            })
        };

        let pages: Vec<(PathBuf, String, String)> = posts
            .par_iter()
            .enumerate()
            .map(|(i, rendered)| -> Result<_, BuildError> {
                let post = &rendered.post;
                let rank = position[i];
                let meta = PageMeta {
                    kind: PageKind::Post,
                    title: &post.title,
                    description: &rendered.description,
                    url: &post.url,
                    date: Some(&post.date),
                };
                let path = url_to_output_path(&post.url);

                let mut context = self.base_context(site_data, &meta);
                context.insert("post", &self.post_data(rendered)?);
                context.insert("previous", &nav(rank.checked_sub(1)));
                context.insert("next", &nav(Some(rank + 1)));

                let html = self
                    .templates
                    .render(&post.layout, &context, &path.display().to_string())?;
                Ok((path, post.source.display().to_string(), html))
            })
            .collect::<Result<_, BuildError>>()?;

        for (path, origin, html) in pages {
            tracing::debug!("Rendered post: {}", path.display());
            output.insert(path, origin, OutputBody::Rendered(html))?;
        }

        Ok(())
    }

    /// Standalone pages such as `about.md`
    fn generate_standalone_pages(
        &self,
        pages: &[Page],
        site_data: &SiteData,
        output: &mut SiteOutput,
    ) -> Result<()> {
        let config = &self.site.config;

        let rendered: Vec<(PathBuf, String, String)> = pages
            .par_iter()
            .map(|page| -> Result<_, BuildError> {
                let content = self.markdown.render(&page.body);
                let description = match &page.description {
                    Some(d) => d.clone(),
                    None => describe(&content),
                };
                let title = if page.title.is_empty() {
                    config.title.clone()
                } else {
                    format!("{} | {}", page.title, config.title)
                };
                let meta = PageMeta {
                    kind: PageKind::Page,
                    title: &title,
                    description: &description,
                    url: &page.url,
                    date: None,
                };
                let path = url_to_output_path(&page.url);

                let mut context = self.base_context(site_data, &meta);
                context.insert(
                    "page",
                    &PageData {
                        title: page.title.clone(),
                        url: url_for(config, &page.url),
                        absolute_url: absolute_url(config, &page.url),
                        content,
                        description,
                        extra: page.extra.clone(),
                    },
                );

                let html = self
                    .templates
                    .render(&page.layout, &context, &path.display().to_string())?;
                Ok((path, page.source.display().to_string(), html))
            })
            .collect::<Result<_, BuildError>>()?;

        for (path, origin, html) in rendered {
            tracing::debug!("Rendered page: {}", path.display());
            output.insert(path, origin, OutputBody::Rendered(html))?;
        }

        Ok(())
    }

    /// Index pages; page 1 is the site root
    fn generate_index_pages(
        &self,
        posts: &[RenderedPost],
        site_data: &SiteData,
        output: &mut SiteOutput,
    ) -> Result<()> {
        let config = &self.site.config;
        let settings = &config.pagination;
        let pagers = self.plugins.paginate(posts, config);
        let link = |n: usize| url_for(config, &page_url(&settings.permalink, n));

        for pager in &pagers {
            let url = page_url(&settings.permalink, pager.number);
            let title = page_title(&config.title, &settings.title, pager.number);
            let meta = PageMeta {
                kind: PageKind::Index,
                title: &title,
                description: "",
                url: &url,
                date: None,
            };
            let path = url_to_output_path(&url);

            let mut context = self.base_context(site_data, &meta);
            context.insert(
                "paginator",
                &PaginationData {
                    page: pager.number,
                    per_page: pager.per_page,
                    total_pages: pager.total_pages,
                    total_posts: posts.len(),
                    previous_page_path: pager.previous().map(link),
                    next_page_path: pager.next().map(link),
                },
            );
            let page_posts = pager
                .items
                .iter()
                .map(|p| self.post_data(p))
                .collect::<Result<Vec<_>, _>>()?;
            context.insert("posts", &page_posts);

            let html = self
                .templates
                .render("index", &context, &path.display().to_string())?;
            tracing::debug!("Rendered index page {}: {}", pager.number, path.display());
            output.insert(
                path,
                format!("index page {}", pager.number),
                OutputBody::Rendered(html),
            )?;
        }

        tracing::info!("Generated {} index pages", pagers.len());
        Ok(())
    }

    /// One archive page per category and per tag
    fn generate_archive_pages(
        &self,
        posts: &[RenderedPost],
        site_data: &SiteData,
        output: &mut SiteOutput,
    ) -> Result<()> {
        let config = &self.site.config;
        let taxonomies = [
            (
                "category",
                config.category_dir.as_str(),
                group_by(posts, |p| p.post.categories.as_slice()),
            ),
            (
                "tag",
                config.tag_dir.as_str(),
                group_by(posts, |p| p.post.tags.as_slice()),
            ),
        ];

        let mut count = 0;
        for (kind, dir, groups) in taxonomies {
            for (name, members) in groups {
                let url = term_url(dir, name);
                let title = format!("{} | {}", name, config.title);
                let meta = PageMeta {
                    kind: PageKind::Archive,
                    title: &title,
                    description: "",
                    url: &url,
                    date: None,
                };
                let path = url_to_output_path(&url);

                let archive_posts = members
                    .iter()
                    .map(|p| self.post_data(p))
                    .collect::<Result<Vec<_>, _>>()?;

                let mut context = self.base_context(site_data, &meta);
                context.insert(
                    "archive",
                    &ArchiveData {
                        kind: kind.to_string(),
                        name: name.to_string(),
                        url: url_for(config, &url),
                        posts: archive_posts,
                    },
                );

                let html = self
                    .templates
                    .render("archive", &context, &path.display().to_string())?;
                output.insert(
                    path,
                    format!("{} archive {:?}", kind, name),
                    OutputBody::Rendered(html),
                )?;
                count += 1;
            }
        }

        tracing::info!("Generated {} archive pages", count);
        Ok(())
    }
}

/// Site-relative URL of a category or tag archive
fn term_url(dir: &str, name: &str) -> String {
    normalize_url(&format!("/{}/{}/", dir, slug::slugify(name)))
}

/// Plain-text summary of rendered HTML
fn describe(html: &str) -> String {
    truncate_chars(
        &squash_whitespace(&strip_html(html)),
        DESCRIPTION_LENGTH,
        "...",
    )
}
