//! Post models

use serde::{Deserialize, Serialize};

/// One heading in a post's table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Heading level, 1-6
    pub level: u8,
    pub text: String,
    /// Anchor id emitted on the rendered heading
    pub id: String,
}

/// A blog post
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// File stem, unique per post
    pub slug: String,

    /// Post title
    pub title: String,

    /// Publication date as written by the author (ISO date)
    pub date: String,

    /// Summary shown in listings
    pub excerpt: String,

    /// Post tags
    pub tags: Vec<String>,

    /// Estimated reading time in minutes
    pub read_time: u32,

    /// Headings in document order
    pub table_of_contents: Vec<TocEntry>,

    /// First image of the body, if it resolves
    pub thumbnail: Option<String>,

    /// Raw markdown body
    pub body: String,

    /// View count joined from the stats store
    pub views: u64,

    /// Rendered HTML, only filled when a single post is requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_html: Option<String>,
}

impl Post {
    /// Four-digit year of the publication date
    pub fn year(&self) -> Option<i32> {
        self.date.get(..4).and_then(|y| y.parse().ok())
    }
}

/// Input of the authoring write path
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, alias = "content")]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Estimated from the body when absent or zero
    #[serde(default)]
    pub read_time: Option<u32>,
    /// Derived from the body headings when empty
    #[serde(default)]
    pub table_of_contents: Vec<TocEntry>,
}

/// Posts published in one year
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveYear {
    pub year: i32,
    pub posts: Vec<Post>,
}

/// A tag with the number of posts carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}
