//! List site content

use anyhow::Result;
use std::collections::BTreeMap;

use crate::content::ContentLoader;
use crate::Site;

/// Print posts, pages, categories or tags
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    let loader = ContentLoader::new(site)?;

    match content_type {
        "post" | "posts" => {
            let posts = loader.load_posts()?;
            println!("Posts ({}):", posts.len());
            for post in posts {
                println!(
                    "  {} - {} [{}]",
                    post.date.format("%Y-%m-%d"),
                    post.title,
                    post.source.display()
                );
            }
        }
        "page" | "pages" => {
            let (pages, _) = loader.load_pages()?;
            println!("Pages ({}):", pages.len());
            for page in pages {
                println!("  {} {} [{}]", page.url, page.title, page.source.display());
            }
        }
        "tag" | "tags" => {
            let posts = loader.load_posts()?;
            print_counts("Tags", count_terms(posts.iter().map(|p| p.tags.as_slice())));
        }
        "category" | "categories" => {
            let posts = loader.load_posts()?;
            print_counts(
                "Categories",
                count_terms(posts.iter().map(|p| p.categories.as_slice())),
            );
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: posts, pages, categories, tags",
                content_type
            );
        }
    }

    Ok(())
}

fn count_terms<'a>(terms: impl Iterator<Item = &'a [String]>) -> Vec<(&'a str, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for term in terms.flatten() {
        *counts.entry(term.as_str()).or_insert(0) += 1;
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    // Most used first, then by name
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn print_counts(heading: &str, counts: Vec<(&str, usize)>) {
    println!("{} ({}):", heading, counts.len());
    for (name, count) in counts {
        println!("  {} ({})", name, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_terms() {
        let a = vec!["rust".to_string(), "web".to_string()];
        let b = vec!["rust".to_string()];
        let c = vec!["cli".to_string()];
        let counts = count_terms([a.as_slice(), b.as_slice(), c.as_slice()].into_iter());
        assert_eq!(counts, vec![("rust", 2), ("cli", 1), ("web", 1)]);
    }
}
