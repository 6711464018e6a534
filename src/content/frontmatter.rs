//! Front-matter parsing

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Why a front-matter block was rejected
#[derive(Error, Debug, PartialEq)]
pub enum FrontMatterError {
    #[error("file does not start with a `---` line")]
    Missing,

    #[error("no closing `---` line")]
    Unterminated,

    #[error("{0}")]
    Yaml(String),
}

/// Custom deserializer that handles both a list of strings and a single
/// whitespace separated string
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.split_whitespace().map(str::to_string).collect())
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Front-matter data from a post or page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub layout: Option<String>,
    pub title: Option<String>,
    pub date: Option<String>,
    #[serde(deserialize_with = "string_or_vec")]
    pub categories: Vec<String>,
    #[serde(deserialize_with = "string_or_vec")]
    pub tags: Vec<String>,
    pub slug: Option<String>,
    pub permalink: Option<String>,
    pub description: Option<String>,
    pub published: bool,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            layout: None,
            title: None,
            date: None,
            categories: Vec::new(),
            tags: Vec::new(),
            slug: None,
            permalink: None,
            description: None,
            published: true,
            extra: IndexMap::new(),
        }
    }
}

impl FrontMatter {
    /// Whether content opens with a front-matter fence
    pub fn detect(content: &str) -> bool {
        let content = content.trim_start_matches('\u{feff}');
        content
            .lines()
            .next()
            .is_some_and(|line| line.trim_end() == "---")
    }

    /// Parse front-matter from content string
    /// Returns (front_matter, body)
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let content = content.trim_start_matches('\u{feff}');
        if !Self::detect(content) {
            return Err(FrontMatterError::Missing);
        }

        // Skip the opening fence line
        let rest = match content.find('\n') {
            Some(pos) => &content[pos + 1..],
            None => return Err(FrontMatterError::Unterminated),
        };

        let mut offset = 0;
        for line in rest.split_inclusive('\n') {
            let fence = line.trim_end();
            if fence == "---" || fence == "..." {
                let yaml = &rest[..offset];
                let body = &rest[offset + line.len()..];
                return Ok((Self::from_yaml(yaml)?, body));
            }
            offset += line.len();
        }

        Err(FrontMatterError::Unterminated)
    }

    fn from_yaml(yaml: &str) -> Result<Self, FrontMatterError> {
        if yaml.trim().is_empty() {
            return Ok(FrontMatter::default());
        }
        serde_yaml::from_str::<FrontMatter>(yaml).map_err(|e| FrontMatterError::Yaml(e.to_string()))
    }
}
