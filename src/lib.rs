//! markpress: a personal markdown blog server
//!
//! Posts are markdown files with YAML front matter, view counts live in a
//! single JSON document, and an admin holding a signed session cookie can
//! publish new posts over HTTP.

pub mod auth;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod helpers;
pub mod server;
pub mod stats;
pub mod storage;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use auth::JwtSessions;
use content::{PostRepository, RepositoryOptions};
use stats::StatsStore;
use storage::{FsStorage, PublicDir};

/// The main blog application
#[derive(Clone)]
pub struct Blog {
    /// Blog configuration
    pub config: config::BlogConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Markdown post directory
    pub posts_dir: PathBuf,
    /// Directory holding the stats document
    pub data_dir: PathBuf,
    /// Static assets served as-is
    pub public_dir: PathBuf,
}

impl Blog {
    /// Open a blog rooted at a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::BlogConfig::load(&config_path)?
        } else {
            config::BlogConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Open a blog with an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::BlogConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let posts_dir = base_dir.join(&config.posts_dir);
        let data_dir = base_dir.join(&config.data_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            posts_dir,
            data_dir,
            public_dir,
        }
    }

    /// View-count store backed by the data directory
    pub fn stats_store(&self) -> StatsStore {
        StatsStore::with_key(
            Arc::new(FsStorage::new(&self.data_dir, "json")),
            self.config.stats_key(),
        )
    }

    /// Post repository over the posts directory
    pub fn repository(&self) -> PostRepository {
        PostRepository::new(
            Arc::new(FsStorage::new(&self.posts_dir, "md")),
            Arc::new(self.stats_store()),
            Arc::new(PublicDir::new(&self.public_dir)),
        )
        .with_options(RepositoryOptions {
            excerpt_length: self.config.excerpt_length,
            read_speed: self.config.read_speed,
        })
    }

    /// Session issuer and verifier using the configured secret
    pub fn sessions(&self) -> JwtSessions {
        JwtSessions::new(&self.config.auth.secret, self.config.auth.session_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_config_file() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.posts_dir, dir.path().join("_posts"));
        assert_eq!(blog.data_dir, dir.path().join("data"));
        assert_eq!(blog.public_dir, dir.path().join("public"));
    }

    #[test]
    fn test_reads_config_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "title: Notes\nposts_dir: posts\nstats_file: counts.json\n",
        )
        .unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "Notes");
        assert_eq!(blog.posts_dir, dir.path().join("posts"));

        blog.stats_store().increment_views("hello");
        assert!(dir.path().join("data/counts.json").exists());
    }

    #[test]
    fn test_repository_reads_posts_dir() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        fs::create_dir_all(&blog.posts_dir).unwrap();
        fs::write(
            blog.posts_dir.join("hello.md"),
            "---\ntitle: Hello\ndate: 2024-01-15\n---\n\nHi there\n",
        )
        .unwrap();
        fs::write(blog.posts_dir.join("notes.txt"), "ignored").unwrap();

        let posts = blog.repository().list_posts().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "hello");
        assert_eq!(posts[0].excerpt, "Hi there");
    }
}
