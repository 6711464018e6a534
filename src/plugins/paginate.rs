//! Index pagination (`jekyll-paginate-v2`, `jekyll-paginate`)

use super::Plugin;
use crate::config::SiteConfig;
use crate::generator::RenderedPost;
use crate::paginate::{paginate, Pager};

pub struct PaginatePlugin;

impl Plugin for PaginatePlugin {
    fn name(&self) -> &'static str {
        "paginate"
    }

    fn paginate<'a>(
        &self,
        posts: &'a [RenderedPost],
        config: &SiteConfig,
    ) -> Option<Vec<Pager<'a, RenderedPost>>> {
        let settings = &config.pagination;
        if !settings.enabled {
            return None;
        }
        Some(paginate(posts, settings.per_page, settings.limit))
    }
}
