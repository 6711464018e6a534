//! Configuration module

mod site;

pub use site::FeedConfig;
pub use site::HighlightConfig;
pub use site::Limit;
pub use site::PaginationConfig;
pub use site::SiteConfig;
pub use site::SortField;
