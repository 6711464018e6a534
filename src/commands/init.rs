//! Initialize a new site

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const CONFIG: &str = r#"# Site
title: My Blog
description: ""
author: ""
lang: en
timezone: UTC

# URL
url: http://localhost:4000
baseurl: ""
permalink: date

# Directory
posts_dir: _posts
layouts_dir: _layouts
destination: _site
category_dir: categories
tag_dir: tags
exclude: [Gemfile, Gemfile.lock, node_modules, vendor]

# Writing
default_layout: post
excerpt_separator: "\n\n"
date_format: "%b %-d, %Y"
highlight:
  theme: base16-ocean.dark
  line_numbers: false

# Index and feed
pagination:
  enabled: true
  per_page: 10
  permalink: /page/:num/
  title: " - page :num"
  limit: 0
  sort_field: date
  sort_reverse: true
feed:
  path: feed.xml
  limit: 0

plugins:
  - jekyll-feed
  - jekyll-seo-tag
  - jekyll-paginate-v2
"#;

const WELCOME_POST: &str = r#"---
layout: post
title: Welcome
date: 2024-01-01 00:00:00 +0000
categories: [general]
tags: [welcome]
---
This is your first post. Edit or delete it, then run `blogsmith build`.

Code blocks are highlighted:

```rust
fn main() {
    println!("Hello, world!");
}
```
"#;

const ABOUT_PAGE: &str = r#"---
title: About
---
Write something about yourself here.
"#;

/// Scaffold a site in `target_dir`
///
/// Existing files are left alone so `init` is safe to re-run.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("_posts"))
        .with_context(|| format!("Failed to create {}", target_dir.display()))?;
    fs::create_dir_all(target_dir.join("_layouts"))?;

    let files = [
        ("_config.yml", CONFIG),
        ("_posts/2024-01-01-welcome.md", WELCOME_POST),
        ("about.md", ABOUT_PAGE),
    ];
    for (relative, content) in files {
        let path = target_dir.join(relative);
        if path.exists() {
            tracing::info!("Keeping existing {}", path.display());
            continue;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!("Created {}", path.display());
    }

    tracing::info!("Initialized site in {}", target_dir.display());
    Ok(())
}
