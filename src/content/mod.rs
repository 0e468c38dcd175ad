//! Content module - posts, front matter, rendering and the post repository

mod frontmatter;
mod markdown;
mod post;
mod repository;
mod thumbnail;

pub use frontmatter::{FrontMatter, FrontMatterError};
pub use markdown::{MarkdownRenderer, Renderer};
pub use post::{ArchiveYear, NewPost, Post, TagCount, TocEntry};
pub use repository::{is_valid_slug, PostRepository, RepositoryOptions};
pub use thumbnail::extract_thumbnail;
