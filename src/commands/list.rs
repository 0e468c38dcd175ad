//! List blog content

use anyhow::Result;
use std::io::{self, Write};

use crate::Blog;

/// List blog content by type
pub fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let stdout = io::stdout();
    write_listing(blog, content_type, &mut stdout.lock())
}

/// Write a listing of `content_type` to `out`
pub fn write_listing<W: Write>(blog: &Blog, content_type: &str, out: &mut W) -> Result<()> {
    let repo = blog.repository();

    match content_type {
        "post" | "posts" => {
            let posts = repo.list_posts()?;
            writeln!(out, "Posts ({}):", posts.len())?;
            for post in posts {
                writeln!(
                    out,
                    "  {} - {} [{}] {} views",
                    post.date, post.title, post.slug, post.views
                )?;
            }
        }
        "tag" | "tags" => {
            let tags = repo.tags()?;
            writeln!(out, "Tags ({}):", tags.len())?;
            for tag in tags {
                writeln!(out, "  {} ({})", tag.name, tag.count)?;
            }
        }
        "archive" | "archives" => {
            for year in repo.archive()? {
                writeln!(out, "{} ({}):", year.year, year.posts.len())?;
                for post in year.posts {
                    writeln!(out, "  {} - {}", post.date, post.title)?;
                }
            }
        }
        "stats" => {
            let stats = repo.stats().get_all_stats();
            writeln!(out, "Stats ({}):", stats.len())?;
            for (slug, record) in stats {
                match record.last_viewed {
                    Some(at) => writeln!(
                        out,
                        "  {} - {} views, last {}",
                        slug,
                        record.views,
                        at.format("%Y-%m-%d %H:%M:%S")
                    )?,
                    None => writeln!(out, "  {} - {} views", slug, record.views)?,
                }
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: posts, tags, archive, stats",
                content_type
            );
        }
    }

    Ok(())
}
