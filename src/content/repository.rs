//! Post repository - markdown files as the content store
//!
//! Every call goes back to storage; nothing is cached, so a created post
//! is visible to the very next read.

use chrono::{NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::frontmatter::FrontMatter;
use super::markdown::{MarkdownRenderer, Renderer};
use super::post::{ArchiveYear, NewPost, Post, TagCount};
use super::thumbnail::extract_thumbnail;
use crate::auth::SessionVerifier;
use crate::error::{BlogError, BlogResult};
use crate::helpers;
use crate::stats::StatsStore;
use crate::storage::{AssetStore, Storage};

/// Whether a slug only uses lowercase letters, digits and hyphens
pub fn is_valid_slug(slug: &str) -> bool {
    lazy_static! {
        static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9-]+$").unwrap();
    }
    SLUG_REGEX.is_match(slug)
}

/// Tunables for derived fields
#[derive(Debug, Clone)]
pub struct RepositoryOptions {
    pub excerpt_length: usize,
    pub read_speed: usize,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            excerpt_length: 150,
            read_speed: 300,
        }
    }
}

type Today = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// Reads, lists and creates posts
pub struct PostRepository {
    posts: Arc<dyn Storage>,
    stats: Arc<StatsStore>,
    assets: Arc<dyn AssetStore>,
    renderer: Arc<dyn Renderer>,
    options: RepositoryOptions,
    today: Today,
}

impl PostRepository {
    pub fn new(posts: Arc<dyn Storage>, stats: Arc<StatsStore>, assets: Arc<dyn AssetStore>) -> Self {
        Self {
            posts,
            stats,
            assets,
            renderer: Arc::new(MarkdownRenderer::new()),
            options: RepositoryOptions::default(),
            today: Box::new(|| Utc::now().date_naive()),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_options(mut self, options: RepositoryOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the date source used to stamp new posts
    pub fn with_today(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    /// View counts backing this repository
    pub fn stats(&self) -> &StatsStore {
        &self.stats
    }

    /// Slugs of every stored post, sorted
    pub fn list_slugs(&self) -> BlogResult<Vec<String>> {
        Ok(self
            .posts
            .list()?
            .into_iter()
            .filter(|slug| is_valid_slug(slug))
            .collect())
    }

    /// All posts, newest first. Posts that fail to load are logged and skipped.
    pub fn list_posts(&self) -> BlogResult<Vec<Post>> {
        let stats = self.stats.get_all_stats();
        let mut posts = Vec::new();

        for slug in self.list_slugs()? {
            let content = match self.posts.get(&slug) {
                Ok(Some(content)) => content,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Failed to read post {}: {}", slug, e);
                    continue;
                }
            };

            match self.parse_post(&slug, &content) {
                Ok(mut post) => {
                    post.views = stats.get(&slug).map(|r| r.views).unwrap_or(0);
                    posts.push(post);
                }
                Err(e) => {
                    tracing::warn!("Failed to load post {}: {}", slug, e);
                }
            }
        }

        // Sort by date descending (newest first); equal dates keep slug order
        posts.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(posts)
    }

    /// One post with its rendered HTML and current view count
    pub fn get_post(&self, slug: &str) -> BlogResult<Post> {
        if !is_valid_slug(slug) {
            return Err(BlogError::NotFound(slug.to_string()));
        }

        let content = self
            .posts
            .get(slug)?
            .ok_or_else(|| BlogError::NotFound(slug.to_string()))?;

        let mut post = self.parse_post(slug, &content)?;
        post.content_html = Some(self.renderer.render(&post.body)?);
        post.views = self.stats.get_views(slug);

        Ok(post)
    }

    /// Persist a new post. The caller's credential must satisfy `verifier`.
    ///
    /// Posts are immutable once written: an existing slug is a conflict,
    /// never an overwrite.
    pub fn create_post(
        &self,
        verifier: &dyn SessionVerifier,
        credential: Option<&str>,
        draft: NewPost,
    ) -> BlogResult<String> {
        let authenticated = credential.map(|c| verifier.verify(c)).unwrap_or(false);
        if !authenticated {
            return Err(BlogError::Unauthorized);
        }

        if draft.title.trim().is_empty() {
            return Err(BlogError::MissingField("title"));
        }
        if draft.slug.trim().is_empty() {
            return Err(BlogError::MissingField("slug"));
        }
        if draft.body.trim().is_empty() {
            return Err(BlogError::MissingField("body"));
        }
        if !is_valid_slug(&draft.slug) {
            return Err(BlogError::InvalidSlug(draft.slug));
        }

        let read_time = draft
            .read_time
            .filter(|minutes| *minutes > 0)
            .unwrap_or_else(|| helpers::read_time(&draft.body, self.options.read_speed));

        let table_of_contents = if draft.table_of_contents.is_empty() {
            MarkdownRenderer::table_of_contents(&draft.body)
        } else {
            draft.table_of_contents
        };

        let front_matter = FrontMatter {
            title: draft.title.trim().to_string(),
            date: (self.today)().format("%Y-%m-%d").to_string(),
            excerpt: Some(helpers::excerpt(&draft.body, self.options.excerpt_length)),
            tags: draft.tags,
            read_time: Some(read_time),
            table_of_contents,
        };

        let file = front_matter.render(&draft.body);
        if !self.posts.put_new(&draft.slug, &file)? {
            return Err(BlogError::Conflict(draft.slug));
        }

        tracing::info!("Created post {}", draft.slug);
        Ok(draft.slug)
    }

    /// Posts grouped by publication year, newest year first
    pub fn archive(&self) -> BlogResult<Vec<ArchiveYear>> {
        let mut years: BTreeMap<i32, Vec<Post>> = BTreeMap::new();
        for post in self.list_posts()? {
            if let Some(year) = post.year() {
                years.entry(year).or_default().push(post);
            }
        }

        Ok(years
            .into_iter()
            .rev()
            .map(|(year, posts)| ArchiveYear { year, posts })
            .collect())
    }

    /// Tags with their post counts, most used first
    pub fn tags(&self) -> BlogResult<Vec<TagCount>> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for post in self.list_posts()? {
            for tag in post.tags {
                *counts.entry(tag).or_insert(0) += 1;
            }
        }

        let mut tags: Vec<TagCount> = counts
            .into_iter()
            .map(|(name, count)| TagCount { name, count })
            .collect();
        tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        Ok(tags)
    }

    /// Parse a stored file into a post without views or rendered HTML
    fn parse_post(&self, slug: &str, content: &str) -> BlogResult<Post> {
        let (fm, body) = FrontMatter::parse(content).map_err(|e| BlogError::Malformed {
            slug: slug.to_string(),
            reason: e.to_string(),
        })?;

        let excerpt = fm
            .excerpt
            .unwrap_or_else(|| helpers::excerpt(body.trim_end(), self.options.excerpt_length));
        let read_time = fm
            .read_time
            .unwrap_or_else(|| helpers::read_time(body, self.options.read_speed));
        let table_of_contents = if fm.table_of_contents.is_empty() {
            MarkdownRenderer::table_of_contents(body)
        } else {
            fm.table_of_contents
        };
        let thumbnail = extract_thumbnail(body, self.assets.as_ref());

        Ok(Post {
            slug: slug.to_string(),
            title: fm.title,
            date: fm.date,
            excerpt,
            tags: fm.tags,
            read_time,
            table_of_contents,
            thumbnail,
            body: body.to_string(),
            views: 0,
            content_html: None,
        })
    }
}
