//! Paginator and indexer
//!
//! Pure functions over the loaded post collection: ordering, partitioning
//! into index pages, grouping by taxonomy and picking feed entries. The
//! same input always produces the same output.

use std::collections::BTreeMap;

use crate::config::{Limit, SortField};
use crate::content::Post;

/// One page of an index: a slice of the ordered collection
#[derive(Debug, Clone, PartialEq)]
pub struct Pager<'a, T> {
    /// 1-based page number
    pub number: usize,
    pub total_pages: usize,
    pub per_page: usize,
    pub items: &'a [T],
}

impl<T> Pager<'_, T> {
    pub fn previous(&self) -> Option<usize> {
        (self.number > 1).then(|| self.number - 1)
    }

    pub fn next(&self) -> Option<usize> {
        (self.number < self.total_pages).then(|| self.number + 1)
    }
}

/// Order posts for the index
///
/// Ties on the sort field are broken by slug so the order is total.
pub fn sort_posts(posts: &mut [Post], field: SortField, reverse: bool) {
    posts.sort_by(|a, b| {
        let primary = match field {
            SortField::Date => a.date.cmp(&b.date),
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        };
        let primary = if reverse { primary.reverse() } else { primary };
        primary.then_with(|| a.slug.cmp(&b.slug))
    });
}

/// Partition `items` into consecutive pages of at most `per_page` items
///
/// Zero items give zero pages. `limit` caps the number of pages.
pub fn paginate<T>(items: &[T], per_page: usize, limit: Limit) -> Vec<Pager<'_, T>> {
    let per_page = per_page.max(1);
    let total_pages = limit.cap(items.len().div_ceil(per_page));

    items
        .chunks(per_page)
        .take(total_pages)
        .enumerate()
        .map(|(i, chunk)| Pager {
            number: i + 1,
            total_pages,
            per_page,
            items: chunk,
        })
        .collect()
}

/// Every item on a single page (zero items still give zero pages)
pub fn single_page<T>(items: &[T]) -> Vec<Pager<'_, T>> {
    paginate(items, items.len(), Limit::unlimited())
}

/// URL of index page `number`; page 1 is the site index
pub fn page_url(permalink: &str, number: usize) -> String {
    if number <= 1 {
        "/".to_string()
    } else {
        crate::helpers::normalize_url(&permalink.replace(":num", &number.to_string()))
    }
}

/// Title of index page `number`
pub fn page_title(site_title: &str, suffix: &str, number: usize) -> String {
    if number <= 1 {
        site_title.to_string()
    } else {
        format!("{}{}", site_title, suffix.replace(":num", &number.to_string()))
    }
}

/// Group items by the terms `terms` returns for each, keeping item order
/// within a group. Groups are keyed (and iterated) by term name.
pub fn group_by<'a, T, F>(items: &'a [T], terms: F) -> BTreeMap<&'a str, Vec<&'a T>>
where
    F: Fn(&'a T) -> &'a [String],
{
    let mut groups: BTreeMap<&'a str, Vec<&'a T>> = BTreeMap::new();
    for item in items {
        for term in terms(item) {
            groups.entry(term.as_str()).or_default().push(item);
        }
    }
    groups
}

/// Most recent entries for the feed: the first `limit` of an ordered slice
pub fn feed_entries<T>(items: &[T], limit: Limit) -> &[T] {
    limit.apply(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::parse_date;
    use chrono_tz::Tz;
    use indexmap::IndexMap;
    use std::path::PathBuf;

    fn post(slug: &str, date: &str) -> Post {
        Post {
            title: slug.to_string(),
            date: parse_date(date, Tz::UTC).unwrap(),
            slug: slug.to_string(),
            categories: Vec::new(),
            tags: Vec::new(),
            layout: "post".to_string(),
            description: None,
            url: format!("/{}/", slug),
            body: String::new(),
            source: PathBuf::from(format!("_posts/{}.md", slug)),
            extra: IndexMap::new(),
        }
    }

    fn is_newest_first(posts: &[&Post]) -> bool {
        posts.windows(2).all(|w| w[0].date >= w[1].date)
    }

    fn twelve_posts() -> Vec<Post> {
        (1..=12)
            .map(|day| post(&format!("post-{:02}", day), &format!("2024-01-{:02}", day)))
            .collect()
    }

    #[test]
    fn test_twelve_posts_five_per_page() {
        let mut posts = twelve_posts();
        sort_posts(&mut posts, SortField::Date, true);

        let pages = paginate(&posts, 5, Limit::unlimited());
        let sizes: Vec<_> = pages.iter().map(|p| p.items.len()).collect();
        assert_eq!(sizes, vec![5, 5, 2]);
        assert!(pages.iter().all(|p| p.total_pages == 3));
        assert_eq!(pages[0].items[0].slug, "post-12");
        assert_eq!(pages[2].items[1].slug, "post-01");
    }

    #[test]
    fn test_page_count_is_ceiling() {
        let posts = twelve_posts();
        for per_page in 1..=15 {
            for len in 0..=posts.len() {
                let pages = paginate(&posts[..len], per_page, Limit::unlimited());
                assert_eq!(pages.len(), len.div_ceil(per_page));
                let total: usize = pages.iter().map(|p| p.items.len()).sum();
                assert_eq!(total, len);
            }
        }
    }

    #[test]
    fn test_zero_posts_zero_pages() {
        let posts: Vec<Post> = Vec::new();
        assert!(paginate(&posts, 5, Limit::unlimited()).is_empty());
        assert!(single_page(&posts).is_empty());
    }

    #[test]
    fn test_fewer_than_page_size_is_one_page() {
        let posts = twelve_posts();
        let pages = paginate(&posts[..3], 5, Limit::unlimited());
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].previous(), None);
        assert_eq!(pages[0].next(), None);
    }

    #[test]
    fn test_pages_are_newest_first_across_boundaries() {
        let mut posts = twelve_posts();
        posts.reverse();
        posts.swap(3, 8);
        sort_posts(&mut posts, SortField::Date, true);

        let pages = paginate(&posts, 5, Limit::unlimited());
        let flat: Vec<&Post> = pages.iter().flat_map(|p| p.items.iter()).collect();
        assert!(is_newest_first(&flat));
    }

    #[test]
    fn test_partition_is_deterministic() {
        let mut a = twelve_posts();
        let mut b = twelve_posts();
        b.reverse();
        sort_posts(&mut a, SortField::Date, true);
        sort_posts(&mut b, SortField::Date, true);
        assert_eq!(paginate(&a, 4, Limit::unlimited()), paginate(&b, 4, Limit::unlimited()));
    }

    #[test]
    fn test_ties_break_on_slug() {
        let mut posts = vec![
            post("beta", "2024-01-01"),
            post("alpha", "2024-01-01"),
            post("gamma", "2024-02-01"),
        ];
        sort_posts(&mut posts, SortField::Date, true);
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["gamma", "alpha", "beta"]);

        sort_posts(&mut posts, SortField::Title, false);
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_limit_caps_pages() {
        let posts = twelve_posts();
        let pages = paginate(&posts, 5, Limit::at_most(2));
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].total_pages, 2);
        assert_eq!(pages[1].next(), None);

        assert_eq!(paginate(&posts, 5, Limit::from(0)).len(), 3);
    }

    #[test]
    fn test_page_urls_and_titles() {
        assert_eq!(page_url("/page/:num/", 1), "/");
        assert_eq!(page_url("/page/:num/", 3), "/page/3/");
        assert_eq!(page_url("blog/:num", 2), "/blog/2");
        assert_eq!(page_title("Blog", " - page :num", 1), "Blog");
        assert_eq!(page_title("Blog", " - page :num", 2), "Blog - page 2");
    }

    #[test]
    fn test_group_by_categories() {
        let mut a = post("a", "2024-03-01");
        a.categories = vec!["rust".to_string(), "web".to_string()];
        let mut b = post("b", "2024-02-01");
        b.categories = vec!["rust".to_string()];
        let c = post("c", "2024-01-01");
        let posts = vec![a, b, c];

        let groups = group_by(&posts, |p| p.categories.as_slice());
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec!["rust", "web"]);
        let rust: Vec<_> = groups["rust"].iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(rust, vec!["a", "b"]);
    }

    #[test]
    fn test_feed_limit_zero_means_all() {
        let posts = twelve_posts();
        assert_eq!(feed_entries(&posts, Limit::from(0)).len(), 12);
        assert_eq!(feed_entries(&posts, Limit::from(5)).len(), 5);
        assert!(feed_entries::<Post>(&[], Limit::from(0)).is_empty());
    }
}
