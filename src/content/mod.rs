//! Content module - posts, pages, static files and Markdown rendering

mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub use frontmatter::{FrontMatter, FrontMatterError};
pub use loader::{ContentLoader, SiteContent};
pub use markdown::MarkdownRenderer;
pub use post::{Page, Post, StaticFile};
