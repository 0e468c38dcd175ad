//! Create a new post

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::content::NewPost;
use crate::Blog;

/// Create a post from the command line.
///
/// Goes through the same repository path as the HTTP API, authenticated
/// with a freshly minted session, so slug rules and conflicts apply alike.
pub fn create_post(
    blog: &Blog,
    title: &str,
    slug: Option<&str>,
    tags: Vec<String>,
    file: Option<&Path>,
) -> Result<String> {
    let slug = match slug {
        Some(s) => s.to_string(),
        None => slug::slugify(title),
    };

    let body = match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?
        }
        None => format!("# {}\n", title),
    };

    let sessions = blog.sessions();
    let token = sessions.issue()?;

    let draft = NewPost {
        title: title.to_string(),
        slug,
        body,
        tags,
        ..Default::default()
    };
    let slug = blog
        .repository()
        .create_post(&sessions, Some(&token), draft)?;

    println!("Created: {:?}", blog.posts_dir.join(format!("{}.md", slug)));

    Ok(slug)
}
