//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"# Blog Configuration

# Site
title: My Blog
description: ''

# Directory
posts_dir: _posts
data_dir: data
stats_file: stats.json
public_dir: public

# Writing
excerpt_length: 150
read_speed: 300

# Server
server:
  ip: localhost
  port: 3000

# Admin sessions
# The secret and password are best supplied through the
# SESSION_SECRET and ADMIN_PASSWORD environment variables.
auth:
  cookie_name: admin-token
  session_hours: 24
  secure_cookie: false
"#;

/// Initialize a new blog in the given directory. Existing files are kept.
pub fn init_site(target_dir: &Path) -> Result<()> {
    // Create directory structure
    fs::create_dir_all(target_dir.join("_posts"))?;
    fs::create_dir_all(target_dir.join("data"))?;
    fs::create_dir_all(target_dir.join("public/images"))?;

    write_if_missing(&target_dir.join("_config.yml"), CONFIG_TEMPLATE)?;

    // Create a sample post
    let today = chrono::Utc::now().format("%Y-%m-%d");
    let sample_post = format!(
        r#"---
title: "Hello World"
date: "{}"
tags: ["welcome"]
---

# Hello World

Welcome to your new blog! Posts live in `_posts/` as markdown files with a
small front matter header.

## Writing a post

```bash
$ markpress new "My New Post" --tags notes
```

## Running the server

```bash
$ markpress server
```

View counts are kept in `data/stats.json`.
"#,
        today
    );
    write_if_missing(&target_dir.join("_posts/hello-world.md"), &sample_post)?;

    Ok(())
}

fn write_if_missing(path: &Path, contents: &str) -> Result<()> {
    if path.exists() {
        tracing::info!("Keeping existing {:?}", path);
        return Ok(());
    }
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Blog;
    use tempfile::TempDir;

    #[test]
    fn test_init_site() {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();

        assert!(dir.path().join("_config.yml").exists());
        assert!(dir.path().join("data").is_dir());
        assert!(dir.path().join("public").is_dir());

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "My Blog");
        let posts = blog.repository().list_posts().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "hello-world");
        assert_eq!(posts[0].tags, vec!["welcome"]);
        assert_eq!(posts[0].table_of_contents[0].id, "hello-world");
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_config.yml"), "title: Mine\n").unwrap();
        init_site(dir.path()).unwrap();

        let config = fs::read_to_string(dir.path().join("_config.yml")).unwrap();
        assert_eq!(config, "title: Mine\n");
    }
}
